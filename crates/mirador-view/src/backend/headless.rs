//! In-process surface host.
//!
//! Simulates everything the compositor core needs from a native host:
//! attachment order (the z-order), per-surface visibility and bounds,
//! navigation history with back/forward flags, and snapshot capture.
//! Navigations complete synchronously, which keeps the service and its
//! tests deterministic. The default host when `wry-backend` is off.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use mirador_common::{PixelRect, SnapshotRef, SurfaceError, TabId, WindowId};

use super::{Surface, SurfaceEvent, SurfaceHost};

struct HostState {
    /// Attachment order; the last entry paints topmost.
    stacking: Vec<(WindowId, TabId)>,
    visible: HashSet<(WindowId, TabId)>,
    bounds: HashMap<(WindowId, TabId), PixelRect>,
    focused: Option<(WindowId, TabId)>,
    events: Vec<SurfaceEvent>,
    failing_urls: HashSet<String>,
    capture_enabled: bool,
}

impl Default for HostState {
    fn default() -> Self {
        Self {
            stacking: Vec::new(),
            visible: HashSet::new(),
            bounds: HashMap::new(),
            focused: None,
            events: Vec::new(),
            failing_urls: HashSet::new(),
            capture_enabled: true,
        }
    }
}

/// The host itself. Cheap to clone state handles out of via [`probe`].
///
/// [`probe`]: HeadlessHost::probe
pub struct HeadlessHost {
    state: Arc<Mutex<HostState>>,
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(HostState::default())),
        }
    }

    /// An inspection/fault-injection handle that stays valid after the host
    /// moves into a registry.
    pub fn probe(&self) -> HeadlessProbe {
        HeadlessProbe {
            state: Arc::clone(&self.state),
        }
    }
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self::new()
    }
}

impl SurfaceHost for HeadlessHost {
    type Surface = HeadlessSurface;

    fn create_surface(
        &mut self,
        window_id: WindowId,
        tab_id: TabId,
        initial_url: &str,
    ) -> Result<Self::Surface, SurfaceError> {
        let key = (window_id, tab_id);
        {
            let mut st = self.state.lock().unwrap();
            st.stacking.push(key);
            st.visible.insert(key);
        }
        let mut surface = HeadlessSurface {
            window_id,
            tab_id,
            state: Arc::clone(&self.state),
            history: Vec::new(),
            index: 0,
        };
        surface.load_url(initial_url)?;
        Ok(surface)
    }

    fn drain_events(&mut self) -> Vec<SurfaceEvent> {
        let mut st = self.state.lock().unwrap();
        std::mem::take(&mut st.events)
    }
}

/// Inspection and fault-injection handle over a [`HeadlessHost`].
#[derive(Clone)]
pub struct HeadlessProbe {
    state: Arc<Mutex<HostState>>,
}

impl HeadlessProbe {
    /// Current attachment order, bottom to top.
    pub fn stacking(&self) -> Vec<(WindowId, TabId)> {
        self.state.lock().unwrap().stacking.clone()
    }

    pub fn topmost(&self) -> Option<(WindowId, TabId)> {
        self.state.lock().unwrap().stacking.last().copied()
    }

    pub fn surface_count(&self) -> usize {
        self.state.lock().unwrap().stacking.len()
    }

    pub fn is_visible(&self, window_id: WindowId, tab_id: TabId) -> bool {
        self.state
            .lock()
            .unwrap()
            .visible
            .contains(&(window_id, tab_id))
    }

    /// Tab ids of this window's currently painting surfaces.
    pub fn visible_tabs(&self, window_id: WindowId) -> Vec<TabId> {
        let st = self.state.lock().unwrap();
        let mut tabs: Vec<TabId> = st
            .visible
            .iter()
            .filter(|(w, _)| *w == window_id)
            .map(|(_, t)| *t)
            .collect();
        tabs.sort_by_key(|t| t.0);
        tabs
    }

    pub fn bounds_of(&self, window_id: WindowId, tab_id: TabId) -> Option<PixelRect> {
        self.state
            .lock()
            .unwrap()
            .bounds
            .get(&(window_id, tab_id))
            .copied()
    }

    pub fn focused(&self) -> Option<(WindowId, TabId)> {
        self.state.lock().unwrap().focused
    }

    /// Make subsequent navigations to `url` fail with a load error.
    pub fn fail_url(&self, url: impl Into<String>) {
        self.state.lock().unwrap().failing_urls.insert(url.into());
    }

    pub fn set_capture_enabled(&self, enabled: bool) {
        self.state.lock().unwrap().capture_enabled = enabled;
    }

    /// Simulate renderer-process death for one surface.
    pub fn inject_crash(&self, window_id: WindowId, tab_id: TabId) {
        self.state
            .lock()
            .unwrap()
            .events
            .push(SurfaceEvent::Crashed { window_id, tab_id });
    }
}

/// A simulated surface with real history semantics.
pub struct HeadlessSurface {
    window_id: WindowId,
    tab_id: TabId,
    state: Arc<Mutex<HostState>>,
    history: Vec<String>,
    index: usize,
}

impl HeadlessSurface {
    fn key(&self) -> (WindowId, TabId) {
        (self.window_id, self.tab_id)
    }

    fn nav_flags(&self) -> (bool, bool) {
        (
            self.index > 0,
            !self.history.is_empty() && self.index + 1 < self.history.len(),
        )
    }

    fn emit_arrival(&self, st: &mut HostState, url: &str) {
        let (can_go_back, can_go_forward) = self.nav_flags();
        st.events.push(SurfaceEvent::NavigationFinished {
            window_id: self.window_id,
            tab_id: self.tab_id,
            url: url.to_string(),
            can_go_back,
            can_go_forward,
        });
        st.events.push(SurfaceEvent::TitleChanged {
            window_id: self.window_id,
            tab_id: self.tab_id,
            title: derive_title(url),
        });
        if let Some(origin) = http_origin(url) {
            st.events.push(SurfaceEvent::FaviconChanged {
                window_id: self.window_id,
                tab_id: self.tab_id,
                favicon_url: format!("{origin}/favicon.ico"),
            });
        }
    }
}

impl Surface for HeadlessSurface {
    fn load_url(&mut self, url: &str) -> Result<(), SurfaceError> {
        let mut st = self.state.lock().unwrap();
        st.events.push(SurfaceEvent::NavigationStarted {
            window_id: self.window_id,
            tab_id: self.tab_id,
            url: url.to_string(),
        });
        if st.failing_urls.contains(url) {
            st.events.push(SurfaceEvent::LoadFailed {
                window_id: self.window_id,
                tab_id: self.tab_id,
                url: url.to_string(),
                message: "name not resolved".to_string(),
            });
            return Ok(());
        }
        if !self.history.is_empty() {
            self.history.truncate(self.index + 1);
        }
        self.history.push(url.to_string());
        self.index = self.history.len() - 1;
        self.emit_arrival(&mut st, url);
        Ok(())
    }

    fn go_back(&mut self) -> Result<(), SurfaceError> {
        if self.index == 0 {
            return Ok(());
        }
        self.index -= 1;
        let url = self.history[self.index].clone();
        let mut st = self.state.lock().unwrap();
        st.events.push(SurfaceEvent::NavigationStarted {
            window_id: self.window_id,
            tab_id: self.tab_id,
            url: url.clone(),
        });
        self.emit_arrival(&mut st, &url);
        Ok(())
    }

    fn go_forward(&mut self) -> Result<(), SurfaceError> {
        if self.history.is_empty() || self.index + 1 >= self.history.len() {
            return Ok(());
        }
        self.index += 1;
        let url = self.history[self.index].clone();
        let mut st = self.state.lock().unwrap();
        st.events.push(SurfaceEvent::NavigationStarted {
            window_id: self.window_id,
            tab_id: self.tab_id,
            url: url.clone(),
        });
        self.emit_arrival(&mut st, &url);
        Ok(())
    }

    fn reload(&mut self) -> Result<(), SurfaceError> {
        let Some(url) = self.history.get(self.index).cloned() else {
            return Ok(());
        };
        let mut st = self.state.lock().unwrap();
        st.events.push(SurfaceEvent::NavigationStarted {
            window_id: self.window_id,
            tab_id: self.tab_id,
            url: url.clone(),
        });
        self.emit_arrival(&mut st, &url);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), SurfaceError> {
        let Some(url) = self.history.get(self.index).cloned() else {
            return Ok(());
        };
        // A stopped load settles on the current entry.
        let mut st = self.state.lock().unwrap();
        let (can_go_back, can_go_forward) = self.nav_flags();
        st.events.push(SurfaceEvent::NavigationFinished {
            window_id: self.window_id,
            tab_id: self.tab_id,
            url,
            can_go_back,
            can_go_forward,
        });
        Ok(())
    }

    fn set_bounds(&mut self, rect: PixelRect) -> Result<(), SurfaceError> {
        self.state.lock().unwrap().bounds.insert(self.key(), rect);
        Ok(())
    }

    fn set_visible(&mut self, visible: bool) -> Result<(), SurfaceError> {
        let mut st = self.state.lock().unwrap();
        if visible {
            st.visible.insert(self.key());
        } else {
            st.visible.remove(&self.key());
        }
        Ok(())
    }

    fn focus(&mut self) -> Result<(), SurfaceError> {
        self.state.lock().unwrap().focused = Some(self.key());
        Ok(())
    }

    fn reattach_top(&mut self) -> Result<(), SurfaceError> {
        let key = self.key();
        let mut st = self.state.lock().unwrap();
        st.stacking.retain(|k| *k != key);
        st.stacking.push(key);
        Ok(())
    }

    fn capture(&mut self) -> Result<Option<SnapshotRef>, SurfaceError> {
        let st = self.state.lock().unwrap();
        if !st.capture_enabled {
            return Ok(None);
        }
        let (w, h) = st
            .bounds
            .get(&self.key())
            .map(|r| (r.width, r.height))
            .unwrap_or((800, 600));
        Ok(Some(SnapshotRef::new(w, h)))
    }
}

impl Drop for HeadlessSurface {
    fn drop(&mut self) {
        if let Ok(mut st) = self.state.lock() {
            let key = self.key();
            st.stacking.retain(|k| *k != key);
            st.visible.remove(&key);
            st.bounds.remove(&key);
            if st.focused == Some(key) {
                st.focused = None;
            }
        }
    }
}

fn derive_title(url: &str) -> String {
    if url == "about:blank" {
        return String::new();
    }
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .or_else(|| url.strip_prefix("file://"))
        .unwrap_or(url);
    rest.split('/').next().unwrap_or(rest).to_string()
}

fn http_origin(url: &str) -> Option<String> {
    let (scheme, rest) = if let Some(rest) = url.strip_prefix("https://") {
        ("https://", rest)
    } else if let Some(rest) = url.strip_prefix("http://") {
        ("http://", rest)
    } else {
        return None;
    };
    let host = rest.split('/').next()?;
    if host.is_empty() {
        return None;
    }
    Some(format!("{scheme}{host}"))
}
