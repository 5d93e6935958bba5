//! Configuration module
//!
//! Handles loading and validating configuration from TOML files and environment variables.

pub mod loader;
pub mod types;

pub use loader::{
    load_config, load_config_from_str, load_config_with_profile, validate_api, validate_config,
};
pub use types::*;
