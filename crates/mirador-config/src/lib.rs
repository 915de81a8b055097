//! Mirador configuration system.
//!
//! TOML-based configuration with live reload and validation. All sections
//! use sensible defaults so partial configs work out of the box.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use mirador_config::load_config;
//!
//! let config = load_config().expect("failed to load config");
//! println!("capture timeout: {:?}", config.compositor.capture_timeout());
//! ```

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{default_config_path, load_from_path};
pub use schema::{CompositorConfig, LoggingConfig, MiradorConfig, WindowConfig};
pub use watcher::{ConfigWatcher, ReloadManager};

use mirador_common::ConfigError;

/// Load config from the platform default path, creating a default file if
/// none exists, and validate the result.
pub fn load_config() -> Result<MiradorConfig, ConfigError> {
    let config = loader::load_default()?;
    validation::validate(&config)?;
    Ok(config)
}

/// Serialize a config to a pretty-printed JSON string (for diagnostics).
pub fn config_to_json(config: &MiradorConfig) -> String {
    serde_json::to_string_pretty(config)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}
