//! UI-process → view-process requests.

use serde::{Deserialize, Serialize};

use crate::errors::ProtocolError;
use crate::types::{Rect, TabId, WindowId};

use super::events::{SnapshotRef, StackEntry};

/// Navigation command executed against a window's active surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavAction {
    Back,
    Forward,
    Reload,
    Stop,
}

/// Every request the UI process may send across the view channel.
///
/// The schema is closed: unknown message types fail deserialization at the
/// boundary instead of reaching business logic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewRequest {
    CreateView {
        window_id: WindowId,
        bounds: Rect,
        initial_url: String,
    },
    CreateTab {
        window_id: WindowId,
        url: Option<String>,
    },
    SwitchTab {
        window_id: WindowId,
        tab_id: TabId,
    },
    CloseTab {
        window_id: WindowId,
        tab_id: TabId,
    },
    LoadUrl {
        window_id: WindowId,
        url: String,
    },
    Navigate {
        window_id: WindowId,
        action: NavAction,
    },
    SetBounds {
        window_id: WindowId,
        rect: Rect,
    },
    SetVisibility {
        window_id: WindowId,
        visible: bool,
        focused: bool,
    },
    DestroyView {
        window_id: WindowId,
    },
    CaptureSnapshot {
        window_id: WindowId,
    },
    ShowAndFocus {
        window_id: WindowId,
    },
    RestackWindows {
        order: Vec<StackEntry>,
    },
}

impl ViewRequest {
    /// Boundary validation. Invalid input is rejected here, synchronously,
    /// and never forwarded to the view process.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        match self {
            ViewRequest::CreateView {
                bounds, initial_url, ..
            } => {
                validate_rect(bounds)?;
                validate_url(initial_url)
            }
            ViewRequest::CreateTab { url: Some(url), .. } => validate_url(url),
            ViewRequest::LoadUrl { url, .. } => validate_url(url),
            ViewRequest::SetBounds { rect, .. } => validate_rect(rect),
            _ => Ok(()),
        }
    }
}

fn validate_url(url: &str) -> Result<(), ProtocolError> {
    if url.trim().is_empty() {
        return Err(ProtocolError::EmptyUrl);
    }
    Ok(())
}

fn validate_rect(rect: &Rect) -> Result<(), ProtocolError> {
    rect.to_pixel()
        .map(|_| ())
        .ok_or_else(|| ProtocolError::InvalidBounds(format!("{rect:?}")))
}

/// Responses travelling back over the view channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewResponse {
    Ack,
    TabCreated { tab_id: TabId },
    Snapshot { snapshot: Option<SnapshotRef> },
    Error { message: String },
}
