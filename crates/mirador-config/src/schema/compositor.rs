//! Compositor tuning.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timing knobs for the surface compositor. Tunables rather than
/// contracts: hosts with slow renderers can stretch the capture timeout,
/// and the bounds flush interval tracks the display's frame budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositorConfig {
    /// How long a snapshot capture may run before the window falls back to
    /// its live surface, in milliseconds.
    pub capture_timeout_ms: u64,
    /// Frame tick driving coalesced surface geometry pushes, in
    /// milliseconds.
    pub bounds_flush_ms: u64,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            capture_timeout_ms: 5000,
            bounds_flush_ms: 16,
        }
    }
}

impl CompositorConfig {
    pub fn capture_timeout(&self) -> Duration {
        Duration::from_millis(self.capture_timeout_ms)
    }

    pub fn bounds_flush_interval(&self) -> Duration {
        Duration::from_millis(self.bounds_flush_ms)
    }
}

// =============================================================================
// Tests
// =============================================================================
