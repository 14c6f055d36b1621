//! Configuration for the Campus Ride client.
//!
//! Provides TOML-based configuration with:
//! - API endpoint and per-send timeout (`[api]`)
//! - Credential storage location (`[storage]`)
//! - Session reconciliation tuning (`[session]`)
//! - Config file layering (user config + project-local overrides + environment)

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{
    load_config, load_config_file, load_config_with_options, save_config, user_config_dir,
    user_config_path, LoadedConfig,
};
pub use error::{ConfigError, Result};
pub use types::*;
