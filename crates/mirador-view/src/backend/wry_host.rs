//! `wry`-backed surface host (feature `wry-backend`).
//!
//! Drives real child webviews composited into a host window. Webview
//! handles are not `Send`, so a service over this host must be driven on a
//! local task set rather than `ViewService::spawn`.
//!
//! Backend limits: wry exposes no snapshot API, so `capture` reports
//! `None` and the freeze controller keeps the live surface visible; history
//! flags are approximated from completed navigations; restacking is
//! best-effort (child views have no reattach primitive).

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::debug;
use wry::raw_window_handle::HasWindowHandle;
use wry::{WebView, WebViewBuilder};

use mirador_common::{PixelRect, SnapshotRef, SurfaceError, TabId, WindowId};

use super::{Surface, SurfaceEvent, SurfaceHost};

type SharedEvents = Arc<Mutex<Vec<SurfaceEvent>>>;
type FinishCounts = Arc<Mutex<HashMap<(WindowId, TabId), u32>>>;

pub struct WryHost<W: HasWindowHandle> {
    window: W,
    events: SharedEvents,
    finishes: FinishCounts,
}

impl<W: HasWindowHandle> WryHost<W> {
    pub fn new(window: W) -> Self {
        Self {
            window,
            events: Arc::new(Mutex::new(Vec::new())),
            finishes: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<W: HasWindowHandle> SurfaceHost for WryHost<W> {
    type Surface = WrySurface;

    fn create_surface(
        &mut self,
        window_id: WindowId,
        tab_id: TabId,
        initial_url: &str,
    ) -> Result<Self::Surface, SurfaceError> {
        let key = (window_id, tab_id);

        let load_events = Arc::clone(&self.events);
        let load_finishes = Arc::clone(&self.finishes);
        let title_events = Arc::clone(&self.events);

        let builder = WebViewBuilder::new()
            .with_focused(false)
            .with_url(initial_url)
            .with_on_page_load_handler(move |event, url| {
                let mut events = load_events.lock().unwrap();
                match event {
                    wry::PageLoadEvent::Started => {
                        events.push(SurfaceEvent::NavigationStarted {
                            window_id,
                            tab_id,
                            url,
                        });
                    }
                    wry::PageLoadEvent::Finished => {
                        let mut finishes = load_finishes.lock().unwrap();
                        let count = finishes.entry(key).or_insert(0);
                        *count += 1;
                        events.push(SurfaceEvent::NavigationFinished {
                            window_id,
                            tab_id,
                            url,
                            can_go_back: *count > 1,
                            can_go_forward: false,
                        });
                    }
                }
            })
            .with_document_title_changed_handler(move |title| {
                if let Ok(mut events) = title_events.lock() {
                    events.push(SurfaceEvent::TitleChanged {
                        window_id,
                        tab_id,
                        title,
                    });
                }
            });

        let webview = builder
            .build_as_child(&self.window)
            .map_err(|e| SurfaceError::Backend(e.to_string()))?;

        debug!(%window_id, %tab_id, url = initial_url, "webview surface created");

        Ok(WrySurface { webview })
    }

    fn drain_events(&mut self) -> Vec<SurfaceEvent> {
        let mut events = self.events.lock().unwrap();
        std::mem::take(&mut *events)
    }
}

pub struct WrySurface {
    webview: WebView,
}

impl WrySurface {
    fn script(&self, js: &str) -> Result<(), SurfaceError> {
        self.webview
            .evaluate_script(js)
            .map_err(|e| SurfaceError::Backend(e.to_string()))
    }
}

impl Surface for WrySurface {
    fn load_url(&mut self, url: &str) -> Result<(), SurfaceError> {
        self.webview
            .load_url(url)
            .map_err(|e| SurfaceError::Backend(e.to_string()))
    }

    fn go_back(&mut self) -> Result<(), SurfaceError> {
        self.script("window.history.back();")
    }

    fn go_forward(&mut self) -> Result<(), SurfaceError> {
        self.script("window.history.forward();")
    }

    fn reload(&mut self) -> Result<(), SurfaceError> {
        self.script("window.location.reload();")
    }

    fn stop(&mut self) -> Result<(), SurfaceError> {
        self.script("window.stop();")
    }

    fn set_bounds(&mut self, rect: PixelRect) -> Result<(), SurfaceError> {
        let bounds = wry::Rect {
            position: wry::dpi::Position::Physical(wry::dpi::PhysicalPosition::new(
                rect.x, rect.y,
            )),
            size: wry::dpi::Size::Physical(wry::dpi::PhysicalSize::new(
                rect.width,
                rect.height,
            )),
        };
        self.webview
            .set_bounds(bounds)
            .map_err(|e| SurfaceError::Backend(e.to_string()))
    }

    fn set_visible(&mut self, visible: bool) -> Result<(), SurfaceError> {
        self.webview
            .set_visible(visible)
            .map_err(|e| SurfaceError::Backend(e.to_string()))
    }

    fn focus(&mut self) -> Result<(), SurfaceError> {
        self.webview
            .focus()
            .map_err(|e| SurfaceError::Backend(e.to_string()))
    }

    fn reattach_top(&mut self) -> Result<(), SurfaceError> {
        // No reattach primitive on child webviews; focusing raises the view
        // on the platforms wry supports here.
        self.webview
            .focus()
            .map_err(|e| SurfaceError::Backend(e.to_string()))
    }

    fn capture(&mut self) -> Result<Option<SnapshotRef>, SurfaceError> {
        Ok(None)
    }
}
