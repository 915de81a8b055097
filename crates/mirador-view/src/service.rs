//! The view-process message loop.
//!
//! Requests arrive as [`Envelope`]s on an mpsc channel and are processed
//! strictly in arrival order: a destroy queued behind a pending create is
//! applied after it, never before, so rapid mount/unmount settles with no
//! live surface. Every request is validated at the boundary before it
//! touches the registries. Events flow back on a separate channel; per-tab
//! ordering follows the order the underlying navigation events occurred.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use mirador_common::{
    NavAction, ProtocolError, Rect, SnapshotRef, StackEntry, TabId, ViewBridge, ViewEvent,
    ViewRequest, ViewResponse, WindowId,
};

use crate::backend::{Surface, SurfaceEvent, SurfaceHost};
use crate::registry::ViewRegistry;
use crate::tabs::{CloseOutcome, TabManager};

/// How often the service drains backend events that arrive outside any
/// request (crash signals, async navigations from a real backend).
const EVENT_PUMP_INTERVAL: Duration = Duration::from_millis(30);

/// One request plus its reply slot.
pub struct Envelope {
    pub request: ViewRequest,
    pub reply: oneshot::Sender<ViewResponse>,
}

/// Client half of the view channel. Cloneable; implements [`ViewBridge`].
#[derive(Clone)]
pub struct ViewHandle {
    tx: mpsc::Sender<Envelope>,
}

/// The view-process service: owns the surface registry and tab manager,
/// and is the single owner of every surface handle.
pub struct ViewService<H: SurfaceHost> {
    registry: ViewRegistry<H>,
    tabs: TabManager,
    rx: mpsc::Receiver<Envelope>,
    events_tx: mpsc::Sender<ViewEvent>,
}

impl<H: SurfaceHost> ViewService<H> {
    pub fn new(host: H) -> (Self, ViewHandle, mpsc::Receiver<ViewEvent>) {
        let (tx, rx) = mpsc::channel(256);
        let (events_tx, events_rx) = mpsc::channel(256);
        let service = Self {
            registry: ViewRegistry::new(host),
            tabs: TabManager::new(),
            rx,
            events_tx,
        };
        (service, ViewHandle { tx }, events_rx)
    }

    /// Spawn the service onto the runtime. For hosts whose surfaces are not
    /// `Send` (real webviews), drive [`run`] on a local task set instead.
    ///
    /// [`run`]: ViewService::run
    pub fn spawn(host: H) -> (ViewHandle, mpsc::Receiver<ViewEvent>)
    where
        H: Send + Sync + 'static,
        H::Surface: Send + Sync,
    {
        let (service, handle, events_rx) = Self::new(host);
        tokio::spawn(service.run());
        (handle, events_rx)
    }

    pub async fn run(mut self) {
        let mut tick = tokio::time::interval(EVENT_PUMP_INTERVAL);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                maybe = self.rx.recv() => {
                    let Some(Envelope { request, reply }) = maybe else {
                        debug!("view channel closed, stopping service");
                        break;
                    };
                    let (response, events) = self.handle(request);
                    let _ = reply.send(response);
                    if !self.emit(events).await {
                        break;
                    }
                }
                _ = tick.tick() => {
                    let events = self.pump();
                    if !self.emit(events).await {
                        break;
                    }
                }
            }
        }
    }

    async fn emit(&self, events: Vec<ViewEvent>) -> bool {
        for event in events {
            if self.events_tx.send(event).await.is_err() {
                debug!("event channel closed, stopping service");
                return false;
            }
        }
        true
    }

    fn handle(&mut self, request: ViewRequest) -> (ViewResponse, Vec<ViewEvent>) {
        if let Err(e) = request.validate() {
            warn!(error = %e, "request rejected at boundary");
            return (error_response(e), Vec::new());
        }

        let mut events = Vec::new();
        let response = match request {
            ViewRequest::CreateView {
                window_id,
                bounds,
                initial_url,
            } => match self.tabs.create_view(&mut self.registry, window_id, &initial_url) {
                Ok(tab_id) => {
                    // Bounds were validated with the request.
                    let _ = self.registry.set_bounds(window_id, tab_id, bounds);
                    ViewResponse::Ack
                }
                Err(e) => error_response(e),
            },
            ViewRequest::CreateTab { window_id, url } => {
                match self.tabs.create_tab(&mut self.registry, window_id, url) {
                    Ok(tab_id) => ViewResponse::TabCreated { tab_id },
                    Err(e) => error_response(e),
                }
            }
            ViewRequest::SwitchTab { window_id, tab_id } => ack_or_error(
                self.tabs.switch_tab(&mut self.registry, window_id, tab_id),
            ),
            ViewRequest::CloseTab { window_id, tab_id } => {
                match self.tabs.close_tab(&mut self.registry, window_id, tab_id) {
                    Ok(CloseOutcome::WindowClosed) => {
                        events.push(ViewEvent::WindowShouldClose { window_id });
                        ViewResponse::Ack
                    }
                    Ok(CloseOutcome::Closed { .. }) => ViewResponse::Ack,
                    Err(e) => error_response(e),
                }
            }
            ViewRequest::LoadUrl { window_id, url } => {
                ack_or_error(self.tabs.load_url(&mut self.registry, window_id, &url))
            }
            ViewRequest::Navigate { window_id, action } => {
                ack_or_error(self.tabs.navigate(&mut self.registry, window_id, action))
            }
            ViewRequest::SetBounds { window_id, rect } => {
                if let Some(tab_id) = self.tabs.active_tab(window_id) {
                    let _ = self.registry.set_bounds(window_id, tab_id, rect);
                } else {
                    debug!(%window_id, "set_bounds for window with no view, ignoring");
                }
                ViewResponse::Ack
            }
            ViewRequest::SetVisibility {
                window_id,
                visible,
                focused,
            } => {
                if let Some(tab_id) = self.tabs.active_tab(window_id) {
                    self.registry.set_visible(window_id, tab_id, visible);
                    if visible && focused {
                        self.registry.focus(window_id, tab_id);
                    }
                }
                ViewResponse::Ack
            }
            ViewRequest::DestroyView { window_id } => {
                self.tabs.destroy_view(&mut self.registry, window_id);
                ViewResponse::Ack
            }
            ViewRequest::CaptureSnapshot { window_id } => {
                ViewResponse::Snapshot {
                    snapshot: self.capture(window_id),
                }
            }
            ViewRequest::ShowAndFocus { window_id } => {
                if let Some(tab_id) = self.tabs.active_tab(window_id) {
                    self.registry.set_visible(window_id, tab_id, true);
                    self.registry.focus(window_id, tab_id);
                }
                ViewResponse::Ack
            }
            ViewRequest::RestackWindows { order } => {
                let resolved: Vec<(WindowId, TabId)> = order
                    .iter()
                    .filter(|entry| !entry.is_minimized)
                    .filter_map(|entry| {
                        self.tabs.active_tab(entry.id).map(|tab| (entry.id, tab))
                    })
                    .collect();
                self.registry.restack(&resolved);
                ViewResponse::Ack
            }
        };

        events.extend(self.pump());
        (response, events)
    }

    /// Capture is a background operation: failures are absorbed and logged,
    /// and the caller sees `None` (it falls back to the live surface).
    fn capture(&mut self, window_id: WindowId) -> Option<SnapshotRef> {
        let tab_id = self.tabs.active_tab(window_id)?;
        let surface = self.registry.surface_mut(window_id, tab_id)?;
        match surface.capture() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(%window_id, %tab_id, error = %e, "snapshot capture failed");
                None
            }
        }
    }

    /// Drain backend events, fold them into tab state, and produce one
    /// `StateChanged` per affected window (full snapshot, so coalescing
    /// per drain is safe).
    fn pump(&mut self) -> Vec<ViewEvent> {
        let mut events = Vec::new();
        let mut changed: Vec<WindowId> = Vec::new();
        for event in self.registry.drain_events() {
            if let SurfaceEvent::Crashed { window_id, tab_id } = event {
                warn!(%window_id, %tab_id, "surface crashed");
                events.push(ViewEvent::SurfaceCrashed { window_id, tab_id });
            }
            if let Some(window_id) = self.tabs.apply_surface_event(&event) {
                if !changed.contains(&window_id) {
                    changed.push(window_id);
                }
            }
        }
        for window_id in changed {
            if let Some(update) = self.tabs.update(window_id) {
                events.push(ViewEvent::StateChanged { window_id, update });
            }
        }
        events
    }
}

fn error_response(e: ProtocolError) -> ViewResponse {
    ViewResponse::Error {
        message: e.to_string(),
    }
}

fn ack_or_error(result: Result<(), ProtocolError>) -> ViewResponse {
    match result {
        Ok(()) => ViewResponse::Ack,
        Err(e) => error_response(e),
    }
}

impl ViewHandle {
    async fn request(&self, request: ViewRequest) -> Result<ViewResponse, ProtocolError> {
        // Invalid input is rejected synchronously, before crossing the
        // channel.
        request.validate()?;
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Envelope {
                request,
                reply: reply_tx,
            })
            .await
            .map_err(|_| ProtocolError::ChannelClosed)?;
        reply_rx.await.map_err(|_| ProtocolError::ChannelClosed)
    }

    async fn request_ack(&self, request: ViewRequest) -> Result<(), ProtocolError> {
        match self.request(request).await? {
            ViewResponse::Error { message } => Err(ProtocolError::Rejected(message)),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl ViewBridge for ViewHandle {
    async fn create_view(
        &self,
        window_id: WindowId,
        bounds: Rect,
        initial_url: &str,
    ) -> Result<(), ProtocolError> {
        self.request_ack(ViewRequest::CreateView {
            window_id,
            bounds,
            initial_url: initial_url.to_string(),
        })
        .await
    }

    async fn create_tab(
        &self,
        window_id: WindowId,
        url: Option<String>,
    ) -> Result<TabId, ProtocolError> {
        match self
            .request(ViewRequest::CreateTab { window_id, url })
            .await?
        {
            ViewResponse::TabCreated { tab_id } => Ok(tab_id),
            ViewResponse::Error { message } => Err(ProtocolError::Rejected(message)),
            other => Err(ProtocolError::MalformedPayload(format!(
                "unexpected response: {other:?}"
            ))),
        }
    }

    async fn switch_tab(&self, window_id: WindowId, tab_id: TabId) -> Result<(), ProtocolError> {
        self.request_ack(ViewRequest::SwitchTab { window_id, tab_id })
            .await
    }

    async fn close_tab(&self, window_id: WindowId, tab_id: TabId) -> Result<(), ProtocolError> {
        self.request_ack(ViewRequest::CloseTab { window_id, tab_id })
            .await
    }

    async fn load_url(&self, window_id: WindowId, url: &str) -> Result<(), ProtocolError> {
        self.request_ack(ViewRequest::LoadUrl {
            window_id,
            url: url.to_string(),
        })
        .await
    }

    async fn navigate(&self, window_id: WindowId, action: NavAction) -> Result<(), ProtocolError> {
        self.request_ack(ViewRequest::Navigate { window_id, action })
            .await
    }

    async fn set_bounds(&self, window_id: WindowId, rect: Rect) -> Result<(), ProtocolError> {
        self.request_ack(ViewRequest::SetBounds { window_id, rect })
            .await
    }

    async fn set_visibility(
        &self,
        window_id: WindowId,
        visible: bool,
        focused: bool,
    ) -> Result<(), ProtocolError> {
        self.request_ack(ViewRequest::SetVisibility {
            window_id,
            visible,
            focused,
        })
        .await
    }

    async fn destroy_view(&self, window_id: WindowId) -> Result<(), ProtocolError> {
        self.request_ack(ViewRequest::DestroyView { window_id })
            .await
    }

    async fn capture_snapshot(
        &self,
        window_id: WindowId,
    ) -> Result<Option<SnapshotRef>, ProtocolError> {
        match self
            .request(ViewRequest::CaptureSnapshot { window_id })
            .await?
        {
            ViewResponse::Snapshot { snapshot } => Ok(snapshot),
            ViewResponse::Error { message } => Err(ProtocolError::Rejected(message)),
            other => Err(ProtocolError::MalformedPayload(format!(
                "unexpected response: {other:?}"
            ))),
        }
    }

    async fn show_and_focus(&self, window_id: WindowId) -> Result<(), ProtocolError> {
        self.request_ack(ViewRequest::ShowAndFocus { window_id })
            .await
    }

    async fn restack_windows(&self, order: &[StackEntry]) -> Result<(), ProtocolError> {
        self.request_ack(ViewRequest::RestackWindows {
            order: order.to_vec(),
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{HeadlessHost, HeadlessProbe};

    const W: WindowId = WindowId(1);

    fn bounds() -> Rect {
        Rect {
            x: 0.0,
            y: 0.0,
            width: 800.0,
            height: 600.0,
        }
    }

    fn spawn() -> (ViewHandle, mpsc::Receiver<ViewEvent>, HeadlessProbe) {
        let host = HeadlessHost::new();
        let probe = host.probe();
        let (handle, events_rx) = ViewService::spawn(host);
        (handle, events_rx, probe)
    }

    async fn next_state_changed(
        events_rx: &mut mpsc::Receiver<ViewEvent>,
    ) -> (WindowId, mirador_common::WindowUpdate) {
        loop {
            match events_rx.recv().await.expect("event stream open") {
                ViewEvent::StateChanged { window_id, update } => return (window_id, update),
                _ => continue,
            }
        }
    }

    #[tokio::test]
    async fn create_view_emits_state() {
        let (handle, mut events_rx, probe) = spawn();
        handle.create_view(W, bounds(), "https://a.com").await.unwrap();
        let (window_id, update) = next_state_changed(&mut events_rx).await;
        assert_eq!(window_id, W);
        assert_eq!(update.tabs.len(), 1);
        assert_eq!(update.tabs[0].url, "https://a.com");
        assert_eq!(probe.surface_count(), 1);
    }

    #[tokio::test]
    async fn duplicate_create_view_keeps_one_surface() {
        let (handle, _events_rx, probe) = spawn();
        handle.create_view(W, bounds(), "https://a.com").await.unwrap();
        handle.create_view(W, bounds(), "https://a.com").await.unwrap();
        assert_eq!(probe.surface_count(), 1);
    }

    #[tokio::test]
    async fn rapid_create_then_destroy_settles_with_no_surface() {
        let (handle, _events_rx, probe) = spawn();
        // Queued back to back; the destroy applies after the create.
        let create = handle.create_view(W, bounds(), "https://a.com");
        let destroy = handle.destroy_view(W);
        let (c, d) = tokio::join!(create, destroy);
        c.unwrap();
        d.unwrap();
        assert_eq!(probe.surface_count(), 0);
    }

    #[tokio::test]
    async fn empty_url_rejected_before_send() {
        let (handle, _events_rx, probe) = spawn();
        handle.create_view(W, bounds(), "https://a.com").await.unwrap();
        let result = handle.load_url(W, "   ").await;
        assert!(matches!(result, Err(ProtocolError::EmptyUrl)));
        assert_eq!(probe.surface_count(), 1);
    }

    #[tokio::test]
    async fn tab_lifecycle_over_the_channel() {
        let (handle, mut events_rx, probe) = spawn();
        handle.create_view(W, bounds(), "https://a.com").await.unwrap();
        let tab = handle
            .create_tab(W, Some("https://b.com".into()))
            .await
            .unwrap();
        assert_eq!(probe.visible_tabs(W), vec![tab]);

        handle.close_tab(W, tab).await.unwrap();
        // The remaining tab is visible again and state reflects one tab.
        loop {
            let (_, update) = next_state_changed(&mut events_rx).await;
            if update.tabs.len() == 1 {
                break;
            }
        }
        assert_eq!(probe.visible_tabs(W).len(), 1);
    }

    #[tokio::test]
    async fn closing_last_tab_reports_window_should_close() {
        let (handle, mut events_rx, _probe) = spawn();
        handle.create_view(W, bounds(), "https://a.com").await.unwrap();
        let tab = match events_rx.recv().await.unwrap() {
            ViewEvent::StateChanged { update, .. } => update.active_tab_id,
            other => panic!("unexpected event: {other:?}"),
        };
        handle.close_tab(W, tab).await.unwrap();

        loop {
            match events_rx.recv().await.unwrap() {
                ViewEvent::WindowShouldClose { window_id } => {
                    assert_eq!(window_id, W);
                    break;
                }
                _ => continue,
            }
        }
    }

    #[tokio::test]
    async fn capture_snapshot_round_trip() {
        let (handle, _events_rx, probe) = spawn();
        handle.create_view(W, bounds(), "https://a.com").await.unwrap();
        let snapshot = handle.capture_snapshot(W).await.unwrap();
        assert!(snapshot.is_some());

        probe.set_capture_enabled(false);
        let snapshot = handle.capture_snapshot(W).await.unwrap();
        assert!(snapshot.is_none());
    }

    #[tokio::test]
    async fn restack_applies_ascending_order() {
        let (handle, _events_rx, probe) = spawn();
        let a = WindowId(1);
        let b = WindowId(2);
        let c = WindowId(3);
        for w in [a, b, c] {
            handle.create_view(w, bounds(), "https://x.com").await.unwrap();
        }
        let order: Vec<StackEntry> = [a, b, c]
            .into_iter()
            .map(|id| StackEntry {
                id,
                is_frozen: false,
                is_minimized: false,
            })
            .collect();
        handle.restack_windows(&order).await.unwrap();
        let top = probe.topmost().unwrap();
        assert_eq!(top.0, c);

        // Idempotent: same order, no visible change.
        let before = probe.stacking();
        handle.restack_windows(&order).await.unwrap();
        assert_eq!(probe.stacking(), before);
    }

    #[tokio::test]
    async fn restack_skips_minimized_windows() {
        let (handle, _events_rx, probe) = spawn();
        let a = WindowId(1);
        let b = WindowId(2);
        handle.create_view(a, bounds(), "https://a.com").await.unwrap();
        handle.create_view(b, bounds(), "https://b.com").await.unwrap();

        let order = vec![
            StackEntry {
                id: b,
                is_frozen: false,
                is_minimized: true,
            },
            StackEntry {
                id: a,
                is_frozen: false,
                is_minimized: false,
            },
        ];
        handle.restack_windows(&order).await.unwrap();
        assert_eq!(probe.topmost().map(|(w, _)| w), Some(a));
    }

    #[tokio::test]
    async fn crash_event_reaches_the_channel() {
        let (handle, mut events_rx, probe) = spawn();
        handle.create_view(W, bounds(), "https://a.com").await.unwrap();
        let (_, update) = next_state_changed(&mut events_rx).await;
        let tab = update.active_tab_id;

        probe.inject_crash(W, tab);
        loop {
            match events_rx.recv().await.unwrap() {
                ViewEvent::SurfaceCrashed { window_id, tab_id } => {
                    assert_eq!((window_id, tab_id), (W, tab));
                    break;
                }
                _ => continue,
            }
        }
    }

    #[tokio::test]
    async fn navigation_keys_off_returned_ids_not_call_order() {
        let (handle, _events_rx, probe) = spawn();
        handle.create_view(W, bounds(), "https://a.com").await.unwrap();
        let (t1, t2) = tokio::join!(
            handle.create_tab(W, Some("https://b.com".into())),
            handle.create_tab(W, Some("https://c.com".into())),
        );
        let (t1, t2) = (t1.unwrap(), t2.unwrap());
        assert_ne!(t1, t2);

        handle.switch_tab(W, t1).await.unwrap();
        assert_eq!(probe.visible_tabs(W), vec![t1]);
        handle.switch_tab(W, t2).await.unwrap();
        assert_eq!(probe.visible_tabs(W), vec![t2]);
    }
}
