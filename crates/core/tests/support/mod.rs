//! Shared test doubles for core integration tests.

#![allow(dead_code)]

pub mod providers;
pub mod stores;
