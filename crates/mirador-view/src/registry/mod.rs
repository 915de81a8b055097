//! Surface registry: `(window, tab) → surface handle`.
//!
//! The registry is the single owner of all surface handles. Attachment to
//! the host compositing tree is controlled here, and attachment order *is*
//! the z-order; there is no direct z-index setter on composited surfaces,
//! so restacking detaches and reattaches in the desired order.

use std::collections::HashMap;

use tracing::{debug, warn};

use mirador_common::{ProtocolError, Rect, SurfaceError, TabId, WindowId};

use crate::backend::{Surface, SurfaceEvent, SurfaceHost};

pub struct ViewRegistry<H: SurfaceHost> {
    host: H,
    surfaces: HashMap<WindowId, HashMap<TabId, H::Surface>>,
}

impl<H: SurfaceHost> ViewRegistry<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            surfaces: HashMap::new(),
        }
    }

    /// Allocate a surface, attach it at the top of the compositing stack,
    /// and begin navigation. Idempotent: a second call for the same
    /// `(window, tab)` returns the existing handle instead of leaking a
    /// duplicate, since the UI layer may mount its controlling component
    /// twice in rapid succession and must not end up with two live
    /// surfaces racing for the same screen region.
    ///
    /// Returns `true` if a surface was actually created.
    pub fn create_surface(
        &mut self,
        window_id: WindowId,
        tab_id: TabId,
        initial_url: &str,
    ) -> Result<bool, SurfaceError> {
        let window = self.surfaces.entry(window_id).or_default();
        if window.contains_key(&tab_id) {
            debug!(%window_id, %tab_id, "surface already exists, reusing");
            return Ok(false);
        }
        let surface = self.host.create_surface(window_id, tab_id, initial_url)?;
        window.insert(tab_id, surface);
        debug!(%window_id, %tab_id, url = initial_url, "surface created");
        Ok(true)
    }

    /// Detach and release a surface. Tolerates already-destroyed or
    /// never-created ids: unmount/remount races mean destroy may be
    /// requested twice. Returns `true` if a surface was actually removed.
    pub fn destroy_surface(&mut self, window_id: WindowId, tab_id: TabId) -> bool {
        let Some(window) = self.surfaces.get_mut(&window_id) else {
            return false;
        };
        let removed = window.remove(&tab_id).is_some();
        if removed {
            debug!(%window_id, %tab_id, "surface destroyed");
        }
        if window.is_empty() {
            self.surfaces.remove(&window_id);
        }
        removed
    }

    /// Release every surface belonging to a window. Returns how many.
    pub fn destroy_window(&mut self, window_id: WindowId) -> usize {
        let count = self
            .surfaces
            .remove(&window_id)
            .map(|tabs| tabs.len())
            .unwrap_or(0);
        if count > 0 {
            debug!(%window_id, count, "window surfaces destroyed");
        }
        count
    }

    pub fn contains(&self, window_id: WindowId, tab_id: TabId) -> bool {
        self.surfaces
            .get(&window_id)
            .is_some_and(|w| w.contains_key(&tab_id))
    }

    pub fn count(&self) -> usize {
        self.surfaces.values().map(|w| w.len()).sum()
    }

    pub fn surface_mut(&mut self, window_id: WindowId, tab_id: TabId) -> Option<&mut H::Surface> {
        self.surfaces.get_mut(&window_id)?.get_mut(&tab_id)
    }

    /// Round a layout rect to pixels and forward it. Fractional input is
    /// rounded here because the surface API truncates and visible seams
    /// appear otherwise; negative extents are rejected. A missing surface
    /// is tolerated (the mount may still be settling).
    pub fn set_bounds(
        &mut self,
        window_id: WindowId,
        tab_id: TabId,
        rect: Rect,
    ) -> Result<(), ProtocolError> {
        let pixel = rect
            .to_pixel()
            .ok_or_else(|| ProtocolError::InvalidBounds(format!("{rect:?}")))?;
        match self.surface_mut(window_id, tab_id) {
            Some(surface) => {
                if let Err(e) = surface.set_bounds(pixel) {
                    warn!(%window_id, %tab_id, error = %e, "failed to set surface bounds");
                }
            }
            None => debug!(%window_id, %tab_id, "set_bounds on absent surface, ignoring"),
        }
        Ok(())
    }

    /// Toggle paint without destroying the handle.
    pub fn set_visible(&mut self, window_id: WindowId, tab_id: TabId, visible: bool) {
        match self.surface_mut(window_id, tab_id) {
            Some(surface) => {
                if let Err(e) = surface.set_visible(visible) {
                    warn!(%window_id, %tab_id, error = %e, "failed to toggle surface visibility");
                }
            }
            None => debug!(%window_id, %tab_id, "set_visible on absent surface, ignoring"),
        }
    }

    pub fn focus(&mut self, window_id: WindowId, tab_id: TabId) {
        if let Some(surface) = self.surface_mut(window_id, tab_id) {
            if let Err(e) = surface.focus() {
                warn!(%window_id, %tab_id, error = %e, "failed to focus surface");
            }
        }
    }

    /// Apply a stacking order, ascending: each `(window, tab)` is detached
    /// and reattached in turn, leaving the last entry topmost. Applying the
    /// same order twice produces the same attachment order (idempotent).
    /// Errors are absorbed and logged; a failed reattach leaves that
    /// surface where it was.
    pub fn restack(&mut self, ordered: &[(WindowId, TabId)]) {
        for &(window_id, tab_id) in ordered {
            match self.surface_mut(window_id, tab_id) {
                Some(surface) => {
                    if let Err(e) = surface.reattach_top() {
                        warn!(%window_id, %tab_id, error = %e, "restack failed for surface");
                    }
                }
                None => debug!(%window_id, %tab_id, "restack on absent surface, ignoring"),
            }
        }
    }

    /// Drain pending backend events, in the order they occurred.
    pub fn drain_events(&mut self) -> Vec<SurfaceEvent> {
        self.host.drain_events()
    }
}
