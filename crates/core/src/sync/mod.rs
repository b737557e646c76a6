//! Sync passes over an external provider.

mod orchestrator;
pub mod ports;

pub use orchestrator::{breaker_error, SyncOrchestrator};
pub use ports::SyncProvider;
