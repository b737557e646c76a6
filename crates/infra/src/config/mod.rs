//! Configuration loading
//!
//! This module loads [`syncward_domain::Config`] from environment variables
//! and TOML/JSON files.

pub mod loader;

// Re-export commonly used items
pub use loader::{load, load_from_env, load_from_file, parse_config, probe_config_paths};
