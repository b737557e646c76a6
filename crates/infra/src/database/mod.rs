//! SQLite persistence.

pub mod failed_job_repository;
pub mod manager;

pub use failed_job_repository::SqliteFailedJobRepository;
pub use manager::{DbManager, SqliteConnection};
