//! # Syncward Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - SQLite dead-letter store behind an r2d2 pool
//! - Configuration loading (environment and TOML/JSON files)
//! - Logging initialization
//! - The log-based alert notifier
//! - [`SyncRuntime`], which wires everything together
//!
//! ## Architecture
//! - Implements traits defined in `syncward-core`
//! - Contains all "impure" code (I/O, process-wide subscriber setup)

pub mod config;
pub mod database;
pub mod errors;
pub mod notifications;
pub mod observability;
pub mod runtime;

// Re-export commonly used items
pub use database::{DbManager, SqliteFailedJobRepository};
pub use errors::{classify_sqlite_failure, InfraError};
pub use notifications::LogAlertNotifier;
pub use observability::init_logging;
pub use runtime::SyncRuntime;
