//! TOML config loading: read from a path or the platform default.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use mirador_common::ConfigError;

use crate::schema::MiradorConfig;
use crate::validation;

/// Default config file, written when none exists.
const DEFAULT_CONFIG_TOML: &str = r#"# Mirador configuration.
# Missing keys fall back to their defaults.

[window]
# titlebar_height = 38
# tab_strip_height = 34
# sidebar_width = 0

[compositor]
# Snapshot capture budget before a window falls back to its live surface.
# capture_timeout_ms = 5000
# Frame tick for coalesced surface geometry pushes.
# bounds_flush_ms = 16

[logging]
# filter = "mirador=info"
"#;

/// Load config from a specific TOML file path.
///
/// Missing fields take serde defaults. After parsing, the config is
/// validated; a validation failure is logged as a warning and the parsed
/// config is returned as-is.
pub fn load_from_path(path: &Path) -> Result<MiradorConfig, ConfigError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::ParseError(format!("failed to read {}: {e}", path.display())))?;

    let config: MiradorConfig = toml::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("failed to parse TOML: {e}")))?;

    if let Err(e) = validation::validate(&config) {
        warn!("config validation warning: {e} — using parsed config as-is");
    }

    info!("loaded config from {}", path.display());
    Ok(config)
}

/// Get the platform-specific default config file path
/// (`~/.config/mirador/config.toml` on Linux).
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::ParseError("could not determine config directory".into()))?;
    Ok(config_dir.join("mirador").join("config.toml"))
}

/// Load config from the platform default path, creating a default config
/// file if none exists.
pub fn load_default() -> Result<MiradorConfig, ConfigError> {
    let path = default_config_path()?;
    match load_from_path(&path) {
        Ok(config) => Ok(config),
        Err(ConfigError::ParseError(msg)) if msg.contains("failed to read") => {
            info!("no config found at {}, creating default", path.display());
            create_default_config(&path)?;
            Ok(MiradorConfig::default())
        }
        Err(e) => Err(e),
    }
}

/// Write the commented default config file.
pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            ConfigError::ParseError(format!(
                "failed to create config directory {}: {e}",
                parent.display()
            ))
        })?;
    }
    std::fs::write(path, DEFAULT_CONFIG_TOML).map_err(|e| {
        ConfigError::ParseError(format!(
            "failed to write default config to {}: {e}",
            path.display()
        ))
    })?;
    info!("created default config at {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_from_path_reads_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[compositor]\ncapture_timeout_ms = 1234\n[window]\nsidebar_width = 200\n",
        )
        .unwrap();

        let config = load_from_path(&path).unwrap();
        assert_eq!(config.compositor.capture_timeout_ms, 1234);
        assert_eq!(config.window.sidebar_width, 200);
        assert_eq!(config.window.titlebar_height, 38);
    }

    #[test]
    fn load_from_missing_path_errors() {
        let result = load_from_path(Path::new("/nonexistent/mirador.toml"));
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn load_from_bad_toml_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[[[not toml").unwrap();
        let result = load_from_path(&path);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn default_template_parses_to_defaults() {
        let config: MiradorConfig = toml::from_str(DEFAULT_CONFIG_TOML).unwrap();
        assert_eq!(config.compositor.capture_timeout_ms, 5000);
    }

    #[test]
    fn create_default_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        create_default_config(&path).unwrap();
        let config = load_from_path(&path).unwrap();
        assert_eq!(config.window.titlebar_height, 38);
    }
}
