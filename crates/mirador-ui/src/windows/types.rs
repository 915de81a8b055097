//! Window and tab records owned by the UI process.

use serde::{Deserialize, Serialize};

use mirador_common::{Rect, TabId, TabState, WindowId, WindowKind};

/// A logical panel in the workspace, distinct from the OS host window.
/// Owned exclusively by the [`WindowStore`]; the view process only ever
/// receives derived geometry and visibility commands.
///
/// [`WindowStore`]: super::WindowStore
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Window {
    pub id: WindowId,
    pub kind: WindowKind,
    pub bounds: Rect,
    pub z_index: u32,
    pub is_focused: bool,
    pub is_minimized: bool,
    /// Present iff `kind` is `Browser`.
    pub browser: Option<BrowserState>,
}

impl Window {
    pub fn is_browser(&self) -> bool {
        self.kind == WindowKind::Browser
    }
}

/// The UI-side copy of a browser window's tab group. The view process is
/// authoritative for everything in here except `pending_url`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrowserState {
    pub tabs: Vec<TabRecord>,
    pub active_tab_id: Option<TabId>,
    pub tab_group_title: Option<String>,
}

impl BrowserState {
    pub fn active_tab(&self) -> Option<&TabRecord> {
        let id = self.active_tab_id?;
        self.tabs.iter().find(|t| t.state.id == id)
    }

    pub fn active_tab_mut(&mut self) -> Option<&mut TabRecord> {
        let id = self.active_tab_id?;
        self.tabs.iter_mut().find(|t| t.state.id == id)
    }
}

/// One tab as the UI sees it: the authoritative state plus the transient
/// optimistic navigation target set when the user submits the address
/// field, before the view process confirms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabRecord {
    pub state: TabState,
    /// Not persisted; a restored session starts with no navigation in
    /// flight.
    #[serde(skip)]
    pub pending_url: Option<String>,
}

impl TabRecord {
    pub fn new(state: TabState) -> Self {
        Self {
            state,
            pending_url: None,
        }
    }

    /// What the address field shows: the in-flight request wins over the
    /// last confirmed URL.
    pub fn display_url(&self) -> &str {
        self.pending_url.as_deref().unwrap_or(&self.state.url)
    }

    /// Merge an authoritative update. An update for the pending URL
    /// confirms it; an update carrying an error settles the navigation;
    /// an update for a *different* URL is an older navigation that the
    /// in-flight request superseded, so its fields are merged but the
    /// display keeps the pending target, silently.
    pub fn apply_authoritative(&mut self, state: TabState) {
        match &self.pending_url {
            Some(pending) if *pending == state.url => self.pending_url = None,
            Some(_) if state.error.is_some() => self.pending_url = None,
            _ => {}
        }
        self.state = state;
    }
}
