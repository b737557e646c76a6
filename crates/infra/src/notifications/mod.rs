//! Alert channels for critical job failures.

mod log_notifier;

pub use log_notifier::LogAlertNotifier;
