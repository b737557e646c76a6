//! Infrastructure error conversions.

mod conversions;

pub use conversions::{classify_sqlite_failure, InfraError};
