//! Retry classification for failed sync executions.
//!
//! [`RetryPolicy`] is the ordered decision table applied by the job rescue
//! path. [`SafetyNet`] is the separate infrastructure layer that handles
//! deadlocks and stale references before the table is consulted.

pub mod policy;
pub mod safety_net;

pub use policy::RetryPolicy;
pub use safety_net::{SafetyNet, SafetyNetAction};
