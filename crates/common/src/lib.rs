//! Domain-free building blocks shared across Syncward crates.
//!
//! Currently this is the [`resilience`] module: a mutex-guarded circuit
//! breaker and the clock abstraction it runs on.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod resilience;
