//! Window chrome configuration.

use serde::{Deserialize, Serialize};

/// Chrome metrics for browser windows. These insets are carved out of a
/// window's bounds before its surface rect is derived.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Height of the title/drag bar in logical pixels.
    pub titlebar_height: u32,
    /// Height of the tab strip in logical pixels.
    pub tab_strip_height: u32,
    /// Width of the left sidebar, 0 to disable.
    pub sidebar_width: u32,
    /// Window border thickness.
    pub border_width: u32,
    /// Default size for newly opened windows.
    pub default_width: u32,
    pub default_height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            titlebar_height: 38,
            tab_strip_height: 34,
            sidebar_width: 0,
            border_width: 1,
            default_width: 960,
            default_height: 720,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
