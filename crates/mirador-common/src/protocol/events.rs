//! View-process → UI-process events and the state they carry.

use serde::{Deserialize, Serialize};

use crate::id::new_id;
use crate::types::{TabId, WindowId};

/// Authoritative per-tab navigation state. The view process is the sole
/// writer of these fields once a tab exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabState {
    pub id: TabId,
    pub url: String,
    pub title: String,
    pub favicon_url: Option<String>,
    pub is_loading: bool,
    pub can_go_back: bool,
    pub can_go_forward: bool,
    pub error: Option<String>,
}

impl TabState {
    pub fn new(id: TabId, url: impl Into<String>) -> Self {
        Self {
            id,
            url: url.into(),
            title: String::new(),
            favicon_url: None,
            is_loading: false,
            can_go_back: false,
            can_go_forward: false,
            error: None,
        }
    }
}

/// Full tab-group snapshot for one window, emitted on any change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowUpdate {
    pub tabs: Vec<TabState>,
    pub active_tab_id: TabId,
    pub tab_group_title: Option<String>,
}

/// Opaque reference to a captured snapshot image. The bitmap itself never
/// crosses the channel; the UI paints by reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRef {
    pub id: String,
    pub width: u32,
    pub height: u32,
}

impl SnapshotRef {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            id: new_id(),
            width,
            height,
        }
    }
}

/// One window's slot in a restack request, ascending z order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackEntry {
    pub id: WindowId,
    pub is_frozen: bool,
    pub is_minimized: bool,
}

/// Events emitted by the view process. Per-tab ordering matches the order
/// the underlying navigation events occurred; there is no ordering guarantee
/// across windows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewEvent {
    StateChanged {
        window_id: WindowId,
        update: WindowUpdate,
    },
    SurfaceCrashed {
        window_id: WindowId,
        tab_id: TabId,
    },
    /// The last tab of a window was closed; closing the window itself is
    /// the UI layer's decision.
    WindowShouldClose {
        window_id: WindowId,
    },
}
