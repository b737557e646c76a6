//! # Syncward Domain
//!
//! Data types shared by the sync control layer.
//!
//! This crate contains:
//! - The closed sync error taxonomy ([`SyncError`], [`ErrorKind`])
//! - Failure bookkeeping records and retry decisions
//! - Job entry-point types (sync type, options, report, outcome)
//! - Configuration structures and defaults
//! - The infrastructure error type ([`SyncwardError`])
//!
//! ## Architecture
//! - No dependencies on other Syncward crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod sync_error;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use sync_error::*;
pub use types::*;
