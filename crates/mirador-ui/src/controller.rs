//! The UI-side orchestrator.
//!
//! Routes user commands and host-window events to the window store, bounds
//! synchronizer, freeze coordinator, and reconciler, and applies the view
//! process's events back into the store. The store is the single owner of
//! window metadata; everything the view process knows is derived from it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::warn;

use mirador_common::url::normalize_url;
use mirador_common::{
    MiradorError, NavAction, ProtocolError, Rect, TabId, ViewBridge, ViewEvent, WindowId,
    WindowKind,
};

use crate::bounds::{BoundsSynchronizer, ChromeInsets};
use crate::freeze::{FreezeCoordinator, FreezeNotice};
use crate::persist::{load_windows, save_windows, LayoutStore};
use crate::reconcile::{ReconcileEffect, StateReconciler};
use crate::windows::WindowStore;

/// Host-window notifications the workspace subscribes to. The host window
/// itself is owned elsewhere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostEvent {
    FocusGained,
    FocusLost,
    Resized { width: f64, height: f64 },
}

pub struct WorkspaceController {
    store: WindowStore,
    reconciler: StateReconciler,
    bounds: BoundsSynchronizer,
    freeze: FreezeCoordinator,
    bridge: Arc<dyn ViewBridge>,
    layout: Arc<dyn LayoutStore>,
}

impl WorkspaceController {
    pub fn new(
        bridge: Arc<dyn ViewBridge>,
        layout: Arc<dyn LayoutStore>,
        insets: ChromeInsets,
        capture_timeout: Duration,
    ) -> (Self, mpsc::Receiver<FreezeNotice>) {
        let (freeze, notices) = FreezeCoordinator::new(bridge.clone(), capture_timeout);
        (
            Self {
                store: WindowStore::new(),
                reconciler: StateReconciler::new(),
                bounds: BoundsSynchronizer::new(insets),
                freeze,
                bridge,
                layout,
            },
            notices,
        )
    }

    pub fn store(&self) -> &WindowStore {
        &self.store
    }

    pub fn freeze(&self) -> &FreezeCoordinator {
        &self.freeze
    }

    /// Load the persisted layout and recreate views for its browser
    /// windows. Every restored window starts with a live, `Active` surface;
    /// freeze state is never persisted.
    pub async fn restore(&mut self) -> Result<(), MiradorError> {
        let Some(saved) = load_windows(self.layout.as_ref()).await? else {
            return Ok(());
        };
        self.store = saved;

        let browsers: Vec<(WindowId, Rect, String)> = self
            .store
            .iter()
            .filter(|w| w.is_browser())
            .map(|w| {
                let url = w
                    .browser
                    .as_ref()
                    .and_then(|b| b.active_tab())
                    .map(|t| t.state.url.clone())
                    .unwrap_or_else(|| "about:blank".to_string());
                (w.id, w.bounds, url)
            })
            .collect();

        for (id, window_bounds, url) in browsers {
            let content = self.bounds.insets().content_rect(window_bounds);
            if let Err(e) = self.bridge.create_view(id, content, &url).await {
                warn!(window_id = %id, error = %e, "failed to restore view");
                continue;
            }
            self.bounds.queue(id, window_bounds);
        }
        self.push_stack().await;
        Ok(())
    }

    // -- Window lifecycle --

    pub async fn open_browser_window(
        &mut self,
        window_bounds: Rect,
        url: &str,
    ) -> Result<WindowId, MiradorError> {
        let url = normalize_url(url)?;
        let id = self.store.open(WindowKind::Browser, window_bounds);
        let content = self.bounds.insets().content_rect(window_bounds);
        if let Err(e) = self.bridge.create_view(id, content, &url).await {
            self.store.close(id);
            return Err(e.into());
        }
        self.bounds.queue(id, window_bounds);
        self.focus_window(id).await;
        Ok(id)
    }

    /// Open a non-browser panel (chat, notes). No surface is involved.
    pub async fn open_panel(&mut self, kind: WindowKind, window_bounds: Rect) -> WindowId {
        let id = self.store.open(kind, window_bounds);
        self.store.focus(id);
        self.save().await;
        id
    }

    pub async fn close_window(&mut self, id: WindowId) {
        let Some(window) = self.store.close(id) else {
            return;
        };
        if window.is_browser() {
            // Tolerant on the view side: the view may already be gone.
            if let Err(e) = self.bridge.destroy_view(id).await {
                warn!(window_id = %id, error = %e, "destroy_view failed");
            }
            self.freeze.remove(id);
            self.bounds.forget(id);
        }
        self.save().await;
    }

    pub async fn focus_window(&mut self, id: WindowId) {
        if !self.store.contains(id) {
            return;
        }
        let previous = self.store.focus(id);
        let is_browser = self.store.get(id).map(|w| w.is_browser()).unwrap_or(false);

        if is_browser {
            // Visibility rides the focus edge synchronously, not batched.
            self.bounds
                .sync_focus(self.bridge.as_ref(), id, true, true)
                .await;
            self.freeze.handle_focus(id).await;
        }

        if let Some(prev) = previous {
            let prev_info = self
                .store
                .get(prev)
                .map(|w| (w.is_browser(), w.is_minimized));
            if let Some((true, minimized)) = prev_info {
                // Stays visible (the snapshot replaces it only after the
                // freeze cycle completes), just unfocused.
                self.bounds
                    .sync_focus(self.bridge.as_ref(), prev, true, false)
                    .await;
                let freeze = self.freeze.clone();
                tokio::spawn(async move { freeze.handle_blur(prev, minimized).await });
            }
        }
        self.push_stack().await;
        self.save().await;
    }

    /// Window moved or resized (continuous during a drag). Geometry is
    /// queued and coalesced by the frame tick.
    pub fn set_window_bounds(&mut self, id: WindowId, window_bounds: Rect) {
        if !self.store.set_bounds(id, window_bounds) {
            return;
        }
        if self.store.get(id).map(|w| w.is_browser()).unwrap_or(false) {
            self.bounds.queue(id, window_bounds);
        }
    }

    pub async fn minimize_window(&mut self, id: WindowId, minimized: bool) {
        if !self.store.set_minimized(id, minimized) {
            return;
        }
        if self.store.get(id).map(|w| w.is_browser()).unwrap_or(false) {
            self.bounds
                .sync_focus(self.bridge.as_ref(), id, !minimized, false)
                .await;
        }
        self.push_stack().await;
        self.save().await;
    }

    // -- Tab commands (authoritative state comes back as events) --

    pub async fn new_tab(
        &mut self,
        id: WindowId,
        url: Option<String>,
    ) -> Result<TabId, ProtocolError> {
        self.bridge.create_tab(id, url).await
    }

    pub async fn switch_tab(&mut self, id: WindowId, tab_id: TabId) -> Result<(), ProtocolError> {
        self.bridge.switch_tab(id, tab_id).await
    }

    pub async fn close_tab(&mut self, id: WindowId, tab_id: TabId) -> Result<(), ProtocolError> {
        self.bridge.close_tab(id, tab_id).await
    }

    /// User pressed Enter in the address field: optimistic local write
    /// first, then the command. Rejected synchronously on invalid input.
    pub async fn load_url(&mut self, id: WindowId, raw_url: &str) -> Result<(), ProtocolError> {
        self.reconciler
            .mark_pending_navigation(&mut self.store, id, raw_url)?;
        self.bridge.load_url(id, raw_url).await
    }

    pub async fn navigate(&mut self, id: WindowId, action: NavAction) -> Result<(), ProtocolError> {
        self.bridge.navigate(id, action).await
    }

    // -- Inbound --

    pub async fn apply_view_event(&mut self, event: ViewEvent) {
        match self.reconciler.apply(&mut self.store, &event) {
            ReconcileEffect::CloseWindow(id) => self.close_window(id).await,
            ReconcileEffect::None => {
                if matches!(event, ViewEvent::StateChanged { .. }) {
                    self.save().await;
                }
            }
        }
    }

    /// The chrome finished painting a snapshot delivered via
    /// [`FreezeNotice`].
    pub async fn snapshot_painted(&self, id: WindowId) {
        self.freeze.snapshot_painted(id).await;
    }

    pub async fn handle_host_event(&mut self, event: HostEvent) {
        match event {
            HostEvent::FocusLost => {
                if let Some(id) = self.store.focused() {
                    let info = self.store.get(id).map(|w| (w.is_browser(), w.is_minimized));
                    if let Some((true, minimized)) = info {
                        let freeze = self.freeze.clone();
                        tokio::spawn(async move { freeze.handle_blur(id, minimized).await });
                    }
                }
            }
            HostEvent::FocusGained => {
                if let Some(id) = self.store.focused() {
                    if self.store.get(id).map(|w| w.is_browser()).unwrap_or(false) {
                        self.freeze.handle_focus(id).await;
                    }
                }
            }
            HostEvent::Resized { .. } => {
                // Chrome relayout: re-derive every browser surface rect;
                // unchanged ones are skipped at flush time.
                let browsers: Vec<(WindowId, Rect)> = self
                    .store
                    .iter()
                    .filter(|w| w.is_browser())
                    .map(|w| (w.id, w.bounds))
                    .collect();
                for (id, b) in browsers {
                    self.bounds.queue(id, b);
                }
            }
        }
    }

    /// Frame tick: flush coalesced geometry.
    pub async fn tick(&mut self) {
        self.bounds.flush(self.bridge.as_ref()).await;
    }

    async fn push_stack(&self) {
        let entries = BoundsSynchronizer::stack_entries(
            self.store.stacking_order().into_iter(),
            |id| self.freeze.is_frozen(id),
        );
        self.bounds
            .push_stack(self.bridge.as_ref(), &entries)
            .await;
    }

    async fn save(&self) {
        if let Err(e) = save_windows(self.layout.as_ref(), &self.store).await {
            warn!(error = %e, "failed to persist window layout");
        }
    }
}
