//! Configuration schema.
//!
//! Every section uses serde defaults, so partial configs work out of the
//! box.

mod compositor;
mod logging;
mod window;

pub use compositor::CompositorConfig;
pub use logging::LoggingConfig;
pub use window::WindowConfig;

use serde::{Deserialize, Serialize};

pub const CONFIG_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MiradorConfig {
    pub window: WindowConfig,
    pub compositor: CompositorConfig,
    pub logging: LoggingConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = MiradorConfig::default();
        let text = toml::to_string(&config).unwrap();
        let parsed: MiradorConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.window.titlebar_height, 38);
        assert_eq!(parsed.compositor.capture_timeout_ms, 5000);
        assert_eq!(parsed.logging.filter, "mirador=info");
    }

    #[test]
    fn empty_toml_is_all_defaults() {
        let config: MiradorConfig = toml::from_str("").unwrap();
        assert_eq!(config.compositor.bounds_flush_ms, 16);
        assert_eq!(config.window.default_width, 960);
    }

    #[test]
    fn unknown_sections_are_ignored() {
        let config: MiradorConfig = toml::from_str("[future_section]\nx = 1\n").unwrap();
        assert_eq!(config.window.titlebar_height, 38);
    }

    #[test]
    fn config_schema_version_is_1() {
        assert_eq!(CONFIG_SCHEMA_VERSION, 1);
    }
}
