//! Convergence of authoritative view-process state into the window store.
//!
//! The view process owns navigation state; the UI only reads it, except
//! for the optimistic `pending_url` it sets the moment the user submits
//! the address field. Reconciliation must converge without clobbering that
//! optimistic write: an authoritative update for an older navigation is
//! merged for its flags but never steals the address field back.

use tracing::{debug, warn};

use mirador_common::{normalize_url, ProtocolError, ViewEvent, WindowId, WindowUpdate};

use crate::windows::{TabRecord, WindowStore};

/// What the caller must do after applying an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileEffect {
    None,
    /// The view process reports the window's last tab closed; the window
    /// itself should now be closed.
    CloseWindow(WindowId),
}

#[derive(Debug, Default)]
pub struct StateReconciler;

impl StateReconciler {
    pub fn new() -> Self {
        Self
    }

    /// Optimistic local write issued with a user navigation: the address
    /// field flips to the requested URL (normalized exactly as the view
    /// process will normalize it) and the tab shows as loading.
    pub fn mark_pending_navigation(
        &self,
        store: &mut WindowStore,
        window_id: WindowId,
        raw_url: &str,
    ) -> Result<(), ProtocolError> {
        let url = normalize_url(raw_url)?;
        let Some(browser) = store.browser_mut(window_id) else {
            return Err(ProtocolError::UnknownWindow(window_id));
        };
        if let Some(tab) = browser.active_tab_mut() {
            tab.pending_url = Some(url);
            tab.state.is_loading = true;
            tab.state.error = None;
        }
        Ok(())
    }

    /// Merge one view-process event into the store.
    pub fn apply(&self, store: &mut WindowStore, event: &ViewEvent) -> ReconcileEffect {
        match event {
            ViewEvent::StateChanged { window_id, update } => {
                self.merge_update(store, *window_id, update);
                ReconcileEffect::None
            }
            ViewEvent::SurfaceCrashed { window_id, tab_id } => {
                // The error lands in tab state via the following
                // StateChanged; this is the spot for chrome-level alerts.
                warn!(%window_id, %tab_id, "surface crashed");
                ReconcileEffect::None
            }
            ViewEvent::WindowShouldClose { window_id } => ReconcileEffect::CloseWindow(*window_id),
        }
    }

    fn merge_update(&self, store: &mut WindowStore, window_id: WindowId, update: &WindowUpdate) {
        let Some(browser) = store.browser_mut(window_id) else {
            debug!(%window_id, "state update for unknown window, dropping");
            return;
        };

        // Rebuild in update order: the view process owns membership and
        // ordering; the UI carries over only its optimistic fields.
        let mut old = std::mem::take(&mut browser.tabs);
        browser.tabs = update
            .tabs
            .iter()
            .map(|state| {
                match old.iter().position(|t| t.state.id == state.id) {
                    Some(idx) => {
                        let mut record = old.swap_remove(idx);
                        record.apply_authoritative(state.clone());
                        record
                    }
                    None => TabRecord::new(state.clone()),
                }
            })
            .collect();
        browser.active_tab_id = Some(update.active_tab_id);
        browser.tab_group_title = update.tab_group_title.clone();
    }
}
