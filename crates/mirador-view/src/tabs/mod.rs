//! Per-window tab collections and navigation command execution.
//!
//! `TabManager` owns the ordered tabs and the active pointer for every
//! browser window, executes navigation commands against the active surface,
//! and folds backend events into the authoritative [`TabState`] records.
//! At most one surface per window is visible at a time, which bounds memory
//! and renderer-process count.

mod group;

pub use group::{TabGroup, TabRemoval};

use std::collections::HashMap;

use tracing::{debug, warn};

use mirador_common::url::normalize_url;
use mirador_common::{
    NavAction, ProtocolError, SurfaceError, TabId, TabState, WindowId, WindowUpdate,
};

use crate::backend::{Surface, SurfaceEvent, SurfaceHost};
use crate::registry::ViewRegistry;

const DEFAULT_TAB_URL: &str = "about:blank";

/// Outcome of a `close_tab` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// Tab removed (or was already gone); `activated` names the newly
    /// active tab when the closed one held the active pointer.
    Closed { activated: Option<TabId> },
    /// The last tab closed; the owning window should be closed by the UI
    /// layer.
    WindowClosed,
}

pub struct TabManager {
    groups: HashMap<WindowId, TabGroup>,
    next_tab: u32,
}

impl TabManager {
    pub fn new() -> Self {
        Self {
            groups: HashMap::new(),
            next_tab: 1,
        }
    }

    fn alloc_tab(&mut self) -> TabId {
        let id = TabId(self.next_tab);
        self.next_tab += 1;
        id
    }

    pub fn contains_window(&self, window_id: WindowId) -> bool {
        self.groups.contains_key(&window_id)
    }

    pub fn active_tab(&self, window_id: WindowId) -> Option<TabId> {
        self.groups.get(&window_id).map(|g| g.active())
    }

    pub fn window_ids(&self) -> Vec<WindowId> {
        self.groups.keys().copied().collect()
    }

    /// Create the view for a browser window with one initial tab.
    /// Idempotent: if the window already has a tab group, the existing
    /// active tab is returned and the surface is reused.
    pub fn create_view<H: SurfaceHost>(
        &mut self,
        registry: &mut ViewRegistry<H>,
        window_id: WindowId,
        initial_url: &str,
    ) -> Result<TabId, ProtocolError> {
        let url = normalize_url(initial_url)?;
        if let Some(group) = self.groups.get(&window_id) {
            let active = group.active();
            debug!(%window_id, %active, "view already exists, reusing");
            // Recreate the surface if it went away (crash, partial teardown).
            create_surface_checked(registry, window_id, active, &url)?;
            return Ok(active);
        }

        let tab_id = self.alloc_tab();
        create_surface_checked(registry, window_id, tab_id, &url)?;
        self.groups
            .insert(window_id, TabGroup::new(TabState::new(tab_id, url)));
        Ok(tab_id)
    }

    /// Append a new tab; it becomes active and its surface is created on
    /// top while the previous active surface is hidden.
    pub fn create_tab<H: SurfaceHost>(
        &mut self,
        registry: &mut ViewRegistry<H>,
        window_id: WindowId,
        url: Option<String>,
    ) -> Result<TabId, ProtocolError> {
        let url = match url {
            Some(raw) => normalize_url(&raw)?,
            None => DEFAULT_TAB_URL.to_string(),
        };
        let Some(group) = self.groups.get(&window_id) else {
            return Err(ProtocolError::UnknownWindow(window_id));
        };
        let previous = group.active();

        let tab_id = self.alloc_tab();
        create_surface_checked(registry, window_id, tab_id, &url)?;
        registry.set_visible(window_id, previous, false);

        if let Some(group) = self.groups.get_mut(&window_id) {
            group.push(TabState::new(tab_id, url));
        }
        Ok(tab_id)
    }

    /// Change the active pointer; the new active surface is shown and the
    /// previous one hidden.
    pub fn switch_tab<H: SurfaceHost>(
        &mut self,
        registry: &mut ViewRegistry<H>,
        window_id: WindowId,
        tab_id: TabId,
    ) -> Result<(), ProtocolError> {
        let Some(group) = self.groups.get_mut(&window_id) else {
            return Err(ProtocolError::UnknownWindow(window_id));
        };
        if !group.contains(tab_id) {
            return Err(ProtocolError::UnknownTab(tab_id));
        }
        let previous = group.active();
        if previous == tab_id {
            return Ok(());
        }
        group.set_active(tab_id);
        registry.set_visible(window_id, previous, false);
        registry.set_visible(window_id, tab_id, true);
        Ok(())
    }

    /// Remove a tab and destroy its surface. Closing an already-gone tab is
    /// a no-op, not an error. Closing the last tab reports `WindowClosed`.
    pub fn close_tab<H: SurfaceHost>(
        &mut self,
        registry: &mut ViewRegistry<H>,
        window_id: WindowId,
        tab_id: TabId,
    ) -> Result<CloseOutcome, ProtocolError> {
        let Some(group) = self.groups.get_mut(&window_id) else {
            return Err(ProtocolError::UnknownWindow(window_id));
        };

        let removal = group.remove(tab_id);
        match removal {
            TabRemoval::NotFound => {
                debug!(%window_id, %tab_id, "close_tab on absent tab, ignoring");
                Ok(CloseOutcome::Closed { activated: None })
            }
            TabRemoval::Removed { activated } => {
                registry.destroy_surface(window_id, tab_id);
                if group.is_empty() {
                    self.groups.remove(&window_id);
                    registry.destroy_window(window_id);
                    return Ok(CloseOutcome::WindowClosed);
                }
                if let Some(next) = activated {
                    registry.set_visible(window_id, next, true);
                }
                Ok(CloseOutcome::Closed { activated })
            }
        }
    }

    /// Destroy a whole view: every tab and surface of the window. Tolerates
    /// an unknown window.
    pub fn destroy_view<H: SurfaceHost>(
        &mut self,
        registry: &mut ViewRegistry<H>,
        window_id: WindowId,
    ) {
        self.groups.remove(&window_id);
        registry.destroy_window(window_id);
    }

    /// Execute a navigation command against the active surface. Back and
    /// forward are no-ops while the corresponding history flag is false.
    pub fn navigate<H: SurfaceHost>(
        &mut self,
        registry: &mut ViewRegistry<H>,
        window_id: WindowId,
        action: NavAction,
    ) -> Result<(), ProtocolError> {
        let Some(group) = self.groups.get(&window_id) else {
            return Err(ProtocolError::UnknownWindow(window_id));
        };
        let tab_id = group.active();
        let Some(state) = group.active_state() else {
            return Err(ProtocolError::UnknownTab(tab_id));
        };

        match action {
            NavAction::Back if !state.can_go_back => return Ok(()),
            NavAction::Forward if !state.can_go_forward => return Ok(()),
            _ => {}
        }

        let Some(surface) = registry.surface_mut(window_id, tab_id) else {
            warn!(%window_id, %tab_id, "navigate with no live surface");
            return Ok(());
        };
        let result = match action {
            NavAction::Back => surface.go_back(),
            NavAction::Forward => surface.go_forward(),
            NavAction::Reload => surface.reload(),
            NavAction::Stop => surface.stop(),
        };
        result.map_err(reject)
    }

    /// Normalize and load a URL in the active tab. If the surface is gone
    /// (e.g. after a renderer crash), it is recreated first; this is the
    /// retry path for crashed views.
    pub fn load_url<H: SurfaceHost>(
        &mut self,
        registry: &mut ViewRegistry<H>,
        window_id: WindowId,
        raw_url: &str,
    ) -> Result<(), ProtocolError> {
        let url = normalize_url(raw_url)?;
        let Some(group) = self.groups.get(&window_id) else {
            return Err(ProtocolError::UnknownWindow(window_id));
        };
        let tab_id = group.active();

        match registry.surface_mut(window_id, tab_id) {
            Some(surface) => surface.load_url(&url).map_err(reject),
            // Gone after a renderer crash: recreating navigates for us.
            None => create_surface_checked(registry, window_id, tab_id, &url),
        }
    }

    /// Fold one backend event into the authoritative tab state. Returns the
    /// owning window id when the event changed anything.
    pub fn apply_surface_event(&mut self, event: &SurfaceEvent) -> Option<WindowId> {
        let (window_id, tab_id) = event.key();
        let group = self.groups.get_mut(&window_id)?;
        let state = group.state_mut(tab_id)?;

        match event {
            SurfaceEvent::NavigationStarted { url, .. } => {
                state.url = url.clone();
                state.is_loading = true;
                state.error = None;
            }
            SurfaceEvent::NavigationFinished {
                url,
                can_go_back,
                can_go_forward,
                ..
            } => {
                state.url = url.clone();
                state.is_loading = false;
                state.can_go_back = *can_go_back;
                state.can_go_forward = *can_go_forward;
            }
            SurfaceEvent::TitleChanged { title, .. } => {
                state.title = title.clone();
            }
            SurfaceEvent::FaviconChanged { favicon_url, .. } => {
                state.favicon_url = Some(favicon_url.clone());
            }
            SurfaceEvent::LoadFailed { url, message, .. } => {
                state.url = url.clone();
                state.is_loading = false;
                state.error = Some(message.clone());
            }
            SurfaceEvent::Crashed { .. } => {
                state.is_loading = false;
                state.error = Some("renderer process crashed".to_string());
            }
        }
        Some(window_id)
    }

    /// Snapshot of a window's tab group, as carried by `state-changed`.
    pub fn update(&self, window_id: WindowId) -> Option<WindowUpdate> {
        let group = self.groups.get(&window_id)?;
        let title = group
            .active_state()
            .map(|t| t.title.clone())
            .filter(|t| !t.is_empty());
        Some(WindowUpdate {
            tabs: group.states().to_vec(),
            active_tab_id: group.active(),
            tab_group_title: title,
        })
    }
}

impl Default for TabManager {
    fn default() -> Self {
        Self::new()
    }
}

fn create_surface_checked<H: SurfaceHost>(
    registry: &mut ViewRegistry<H>,
    window_id: WindowId,
    tab_id: TabId,
    url: &str,
) -> Result<(), ProtocolError> {
    registry
        .create_surface(window_id, tab_id, url)
        .map(|_| ())
        .map_err(reject)
}

fn reject(e: SurfaceError) -> ProtocolError {
    ProtocolError::Rejected(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{HeadlessHost, HeadlessProbe};

    const W: WindowId = WindowId(1);

    fn setup() -> (TabManager, ViewRegistry<HeadlessHost>, HeadlessProbe) {
        let host = HeadlessHost::new();
        let probe = host.probe();
        (TabManager::new(), ViewRegistry::new(host), probe)
    }

    fn drain_into(mgr: &mut TabManager, reg: &mut ViewRegistry<HeadlessHost>) {
        for event in reg.drain_events() {
            mgr.apply_surface_event(&event);
        }
    }

    #[test]
    fn create_view_makes_one_tab() {
        let (mut mgr, mut reg, probe) = setup();
        let tab = mgr.create_view(&mut reg, W, "https://a.com").unwrap();
        assert_eq!(mgr.active_tab(W), Some(tab));
        assert_eq!(probe.surface_count(), 1);
    }

    #[test]
    fn create_view_is_idempotent() {
        let (mut mgr, mut reg, probe) = setup();
        let first = mgr.create_view(&mut reg, W, "https://a.com").unwrap();
        let second = mgr.create_view(&mut reg, W, "https://a.com").unwrap();
        assert_eq!(first, second);
        assert_eq!(probe.surface_count(), 1);
    }

    #[test]
    fn create_tab_becomes_active_and_hides_previous() {
        let (mut mgr, mut reg, probe) = setup();
        let first = mgr.create_view(&mut reg, W, "https://a.com").unwrap();
        let second = mgr
            .create_tab(&mut reg, W, Some("https://b.com".into()))
            .unwrap();
        assert_eq!(mgr.active_tab(W), Some(second));
        assert_eq!(probe.visible_tabs(W), vec![second]);
        assert!(!probe.is_visible(W, first));
    }

    #[test]
    fn create_tab_without_url_opens_blank() {
        let (mut mgr, mut reg, _probe) = setup();
        mgr.create_view(&mut reg, W, "https://a.com").unwrap();
        let tab = mgr.create_tab(&mut reg, W, None).unwrap();
        drain_into(&mut mgr, &mut reg);
        let update = mgr.update(W).unwrap();
        let state = update.tabs.iter().find(|t| t.id == tab).unwrap();
        assert_eq!(state.url, "about:blank");
    }

    #[test]
    fn create_tab_on_unknown_window_fails() {
        let (mut mgr, mut reg, _probe) = setup();
        let result = mgr.create_tab(&mut reg, WindowId(9), None);
        assert!(matches!(result, Err(ProtocolError::UnknownWindow(_))));
    }

    #[test]
    fn at_most_one_visible_surface_after_any_switch_sequence() {
        let (mut mgr, mut reg, probe) = setup();
        let t1 = mgr.create_view(&mut reg, W, "https://a.com").unwrap();
        let t2 = mgr
            .create_tab(&mut reg, W, Some("https://b.com".into()))
            .unwrap();
        let t3 = mgr
            .create_tab(&mut reg, W, Some("https://c.com".into()))
            .unwrap();

        for target in [t1, t3, t2, t2, t1, t3] {
            mgr.switch_tab(&mut reg, W, target).unwrap();
            assert_eq!(probe.visible_tabs(W), vec![target]);
        }
    }

    #[test]
    fn switch_to_unknown_tab_fails() {
        let (mut mgr, mut reg, _probe) = setup();
        mgr.create_view(&mut reg, W, "https://a.com").unwrap();
        let result = mgr.switch_tab(&mut reg, W, TabId(42));
        assert!(matches!(result, Err(ProtocolError::UnknownTab(_))));
    }

    #[test]
    fn close_active_activates_left_neighbor() {
        let (mut mgr, mut reg, probe) = setup();
        let t1 = mgr.create_view(&mut reg, W, "https://a.com").unwrap();
        let t2 = mgr
            .create_tab(&mut reg, W, Some("https://b.com".into()))
            .unwrap();
        let outcome = mgr.close_tab(&mut reg, W, t2).unwrap();
        assert_eq!(
            outcome,
            CloseOutcome::Closed {
                activated: Some(t1)
            }
        );
        assert_eq!(probe.visible_tabs(W), vec![t1]);
    }

    #[test]
    fn close_leftmost_activates_right_neighbor() {
        let (mut mgr, mut reg, _probe) = setup();
        let t1 = mgr.create_view(&mut reg, W, "https://a.com").unwrap();
        let t2 = mgr
            .create_tab(&mut reg, W, Some("https://b.com".into()))
            .unwrap();
        mgr.switch_tab(&mut reg, W, t1).unwrap();
        let outcome = mgr.close_tab(&mut reg, W, t1).unwrap();
        assert_eq!(
            outcome,
            CloseOutcome::Closed {
                activated: Some(t2)
            }
        );
    }

    #[test]
    fn closing_last_tab_closes_window() {
        let (mut mgr, mut reg, probe) = setup();
        let tab = mgr.create_view(&mut reg, W, "https://a.com").unwrap();
        let outcome = mgr.close_tab(&mut reg, W, tab).unwrap();
        assert_eq!(outcome, CloseOutcome::WindowClosed);
        assert!(!mgr.contains_window(W));
        assert_eq!(probe.surface_count(), 0);
    }

    #[test]
    fn close_absent_tab_is_a_no_op() {
        let (mut mgr, mut reg, _probe) = setup();
        mgr.create_view(&mut reg, W, "https://a.com").unwrap();
        let outcome = mgr.close_tab(&mut reg, W, TabId(42)).unwrap();
        assert_eq!(outcome, CloseOutcome::Closed { activated: None });
        assert!(mgr.contains_window(W));
    }

    #[test]
    fn back_is_a_no_op_until_history_allows_it() {
        let (mut mgr, mut reg, _probe) = setup();
        mgr.create_view(&mut reg, W, "https://a.com").unwrap();
        drain_into(&mut mgr, &mut reg);

        // can_go_back is false; this must not throw and must not navigate
        mgr.navigate(&mut reg, W, NavAction::Back).unwrap();
        assert!(reg.drain_events().is_empty());

        mgr.load_url(&mut reg, W, "https://b.com").unwrap();
        drain_into(&mut mgr, &mut reg);
        mgr.navigate(&mut reg, W, NavAction::Back).unwrap();
        drain_into(&mut mgr, &mut reg);

        let update = mgr.update(W).unwrap();
        let state = &update.tabs[0];
        assert_eq!(state.url, "https://a.com");
        assert!(!state.can_go_back);
        assert!(state.can_go_forward);
    }

    #[test]
    fn load_url_rejects_empty_input() {
        let (mut mgr, mut reg, _probe) = setup();
        mgr.create_view(&mut reg, W, "https://a.com").unwrap();
        let result = mgr.load_url(&mut reg, W, "   ");
        assert!(matches!(result, Err(ProtocolError::EmptyUrl)));
    }

    #[test]
    fn load_url_assumes_https_for_bare_hosts() {
        let (mut mgr, mut reg, _probe) = setup();
        mgr.create_view(&mut reg, W, "https://a.com").unwrap();
        mgr.load_url(&mut reg, W, "example.com").unwrap();
        drain_into(&mut mgr, &mut reg);
        let update = mgr.update(W).unwrap();
        assert_eq!(update.tabs[0].url, "https://example.com");
    }

    #[test]
    fn load_failure_lands_in_tab_error() {
        let (mut mgr, mut reg, probe) = setup();
        mgr.create_view(&mut reg, W, "https://a.com").unwrap();
        drain_into(&mut mgr, &mut reg);
        probe.fail_url("https://down.example");
        mgr.load_url(&mut reg, W, "https://down.example").unwrap();
        drain_into(&mut mgr, &mut reg);

        let update = mgr.update(W).unwrap();
        let state = &update.tabs[0];
        assert_eq!(state.error.as_deref(), Some("name not resolved"));
        assert!(!state.is_loading);
    }

    #[test]
    fn crash_reported_then_reload_recreates_surface() {
        let (mut mgr, mut reg, probe) = setup();
        let tab = mgr.create_view(&mut reg, W, "https://a.com").unwrap();
        drain_into(&mut mgr, &mut reg);

        probe.inject_crash(W, tab);
        reg.destroy_surface(W, tab);
        drain_into(&mut mgr, &mut reg);
        let update = mgr.update(W).unwrap();
        assert!(update.tabs[0].error.is_some());

        // Retry via load_url recreates the surface
        mgr.load_url(&mut reg, W, "https://a.com").unwrap();
        assert!(reg.contains(W, tab));
    }

    #[test]
    fn update_carries_group_title_from_active_tab() {
        let (mut mgr, mut reg, _probe) = setup();
        mgr.create_view(&mut reg, W, "https://news.example.com/x")
            .unwrap();
        drain_into(&mut mgr, &mut reg);
        let update = mgr.update(W).unwrap();
        assert_eq!(update.tab_group_title.as_deref(), Some("news.example.com"));
    }
}
