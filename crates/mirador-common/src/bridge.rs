//! The async boundary trait between the UI process and the view process.
//!
//! Every call suspends the caller until the view process acknowledges (or
//! the channel reports failure). UI-side components are written against this
//! trait so they can be exercised with a recording mock in tests.

use async_trait::async_trait;

use crate::errors::ProtocolError;
use crate::protocol::{NavAction, SnapshotRef, StackEntry};
use crate::types::{Rect, TabId, WindowId};

#[async_trait]
pub trait ViewBridge: Send + Sync {
    /// Create the view (and its first tab) for a browser window.
    async fn create_view(
        &self,
        window_id: WindowId,
        bounds: Rect,
        initial_url: &str,
    ) -> Result<(), ProtocolError>;

    /// Append a new tab; it becomes the active tab. Returns the new tab id.
    async fn create_tab(
        &self,
        window_id: WindowId,
        url: Option<String>,
    ) -> Result<TabId, ProtocolError>;

    async fn switch_tab(&self, window_id: WindowId, tab_id: TabId) -> Result<(), ProtocolError>;

    async fn close_tab(&self, window_id: WindowId, tab_id: TabId) -> Result<(), ProtocolError>;

    async fn load_url(&self, window_id: WindowId, url: &str) -> Result<(), ProtocolError>;

    async fn navigate(&self, window_id: WindowId, action: NavAction) -> Result<(), ProtocolError>;

    async fn set_bounds(&self, window_id: WindowId, rect: Rect) -> Result<(), ProtocolError>;

    async fn set_visibility(
        &self,
        window_id: WindowId,
        visible: bool,
        focused: bool,
    ) -> Result<(), ProtocolError>;

    async fn destroy_view(&self, window_id: WindowId) -> Result<(), ProtocolError>;

    /// Request a static snapshot of the window's active surface.
    /// `None` means the backend could not produce one.
    async fn capture_snapshot(
        &self,
        window_id: WindowId,
    ) -> Result<Option<SnapshotRef>, ProtocolError>;

    /// Show the live surface and give it input focus.
    async fn show_and_focus(&self, window_id: WindowId) -> Result<(), ProtocolError>;

    /// Apply a new stacking order, ascending (last entry ends up topmost).
    async fn restack_windows(&self, order: &[StackEntry]) -> Result<(), ProtocolError>;
}
