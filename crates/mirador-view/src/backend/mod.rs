//! Surface backends.
//!
//! A `Surface` is an opaque, process-local rendering target composited into
//! the host window; a `SurfaceHost` allocates them and reports what they do.
//! The registry and tab manager are written against these traits so the
//! compositor core is backend-agnostic: the default `headless` host fully
//! simulates attachment order, navigation history, and snapshot capture, and
//! the `wry` host (feature `wry-backend`) drives real webviews.

mod headless;
#[cfg(feature = "wry-backend")]
pub mod wry_host;

pub use headless::{HeadlessHost, HeadlessProbe};

use mirador_common::{PixelRect, SnapshotRef, SurfaceError, TabId, WindowId};

/// One out-of-process rendering surface. Attachment to the host window's
/// compositing tree is implicit in creation; dropping the handle detaches
/// and releases it.
pub trait Surface {
    fn load_url(&mut self, url: &str) -> Result<(), SurfaceError>;

    fn go_back(&mut self) -> Result<(), SurfaceError>;

    fn go_forward(&mut self) -> Result<(), SurfaceError>;

    fn reload(&mut self) -> Result<(), SurfaceError>;

    fn stop(&mut self) -> Result<(), SurfaceError>;

    fn set_bounds(&mut self, rect: PixelRect) -> Result<(), SurfaceError>;

    /// Toggle paint without destroying the handle.
    fn set_visible(&mut self, visible: bool) -> Result<(), SurfaceError>;

    fn focus(&mut self) -> Result<(), SurfaceError>;

    /// Detach from the compositing tree and reattach at the top. Attachment
    /// order is the z-order; this is the only stacking primitive.
    fn reattach_top(&mut self) -> Result<(), SurfaceError>;

    /// Capture a static snapshot of the current contents. `Ok(None)` means
    /// the backend cannot produce one (the caller falls back to keeping the
    /// live surface visible).
    fn capture(&mut self) -> Result<Option<SnapshotRef>, SurfaceError>;
}

/// Allocates surfaces and surfaces their events.
pub trait SurfaceHost {
    type Surface: Surface;

    /// Allocate a surface attached at the top of the compositing stack and
    /// begin navigating it to `initial_url`.
    fn create_surface(
        &mut self,
        window_id: WindowId,
        tab_id: TabId,
        initial_url: &str,
    ) -> Result<Self::Surface, SurfaceError>;

    /// Drain all pending events, in the order they occurred.
    fn drain_events(&mut self) -> Vec<SurfaceEvent>;
}

/// Events reported by the host about its surfaces. Per-surface ordering is
/// preserved; there is no ordering guarantee across surfaces.
#[derive(Debug, Clone)]
pub enum SurfaceEvent {
    NavigationStarted {
        window_id: WindowId,
        tab_id: TabId,
        url: String,
    },
    NavigationFinished {
        window_id: WindowId,
        tab_id: TabId,
        url: String,
        can_go_back: bool,
        can_go_forward: bool,
    },
    TitleChanged {
        window_id: WindowId,
        tab_id: TabId,
        title: String,
    },
    FaviconChanged {
        window_id: WindowId,
        tab_id: TabId,
        favicon_url: String,
    },
    LoadFailed {
        window_id: WindowId,
        tab_id: TabId,
        url: String,
        message: String,
    },
    /// Renderer-process death signalled by the host.
    Crashed {
        window_id: WindowId,
        tab_id: TabId,
    },
}

impl SurfaceEvent {
    /// The `(window, tab)` the event belongs to.
    pub fn key(&self) -> (WindowId, TabId) {
        match self {
            SurfaceEvent::NavigationStarted {
                window_id, tab_id, ..
            }
            | SurfaceEvent::NavigationFinished {
                window_id, tab_id, ..
            }
            | SurfaceEvent::TitleChanged {
                window_id, tab_id, ..
            }
            | SurfaceEvent::FaviconChanged {
                window_id, tab_id, ..
            }
            | SurfaceEvent::LoadFailed {
                window_id, tab_id, ..
            }
            | SurfaceEvent::Crashed { window_id, tab_id } => (*window_id, *tab_id),
        }
    }
}
