//! In-memory observability of recent sync failures.

mod tracker;

pub use tracker::ErrorTracker;
