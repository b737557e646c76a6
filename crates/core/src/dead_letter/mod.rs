//! Durable bookkeeping for jobs that exhausted their retries.

pub mod ports;
mod sink;

pub use ports::{AlertNotifier, FailedJobStore};
pub use sink::DeadLetterSink;
