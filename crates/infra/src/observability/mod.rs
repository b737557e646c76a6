//! Observability infrastructure
//!
//! Installs the process-wide `tracing` subscriber. Components emit
//! structured events with an `event` field (`sync_error`,
//! `job_permanently_failed`, `job_discarded`, `critical_job_failed`) that log
//! pipelines can filter on.

pub mod logging;

pub use logging::{init_logging, json_subscriber};
