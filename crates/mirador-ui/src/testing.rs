//! Recording `ViewBridge` used by unit tests across this crate.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use mirador_common::{
    NavAction, PixelRect, ProtocolError, Rect, SnapshotRef, StackEntry, TabId, ViewBridge,
    WindowId,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    CreateView(WindowId, String),
    CreateTab(WindowId),
    SwitchTab(WindowId, TabId),
    CloseTab(WindowId, TabId),
    LoadUrl(WindowId, String),
    Navigate(WindowId, NavAction),
    SetBounds(WindowId, PixelRect),
    SetVisibility(WindowId, bool, bool),
    DestroyView(WindowId),
    Capture(WindowId),
    ShowAndFocus(WindowId),
    Restack(Vec<WindowId>),
}

#[derive(Debug, Clone)]
pub(crate) enum CaptureMode {
    Succeed,
    Fail,
    /// Never resolves; exercises the timeout path.
    Hang,
    /// Resolves (successfully) once the notify fires.
    Gated(Arc<Notify>),
}

pub(crate) struct RecordingBridge {
    calls: Mutex<Vec<Call>>,
    capture_mode: Mutex<CaptureMode>,
    next_tab: AtomicU32,
}

impl RecordingBridge {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            capture_mode: Mutex::new(CaptureMode::Succeed),
            next_tab: AtomicU32::new(1),
        }
    }

    pub fn set_capture_mode(&self, mode: CaptureMode) {
        *self.capture_mode.lock().unwrap() = mode;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count_of(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ViewBridge for RecordingBridge {
    async fn create_view(
        &self,
        window_id: WindowId,
        _bounds: Rect,
        initial_url: &str,
    ) -> Result<(), ProtocolError> {
        self.record(Call::CreateView(window_id, initial_url.to_string()));
        Ok(())
    }

    async fn create_tab(
        &self,
        window_id: WindowId,
        _url: Option<String>,
    ) -> Result<TabId, ProtocolError> {
        self.record(Call::CreateTab(window_id));
        Ok(TabId(self.next_tab.fetch_add(1, Ordering::Relaxed)))
    }

    async fn switch_tab(&self, window_id: WindowId, tab_id: TabId) -> Result<(), ProtocolError> {
        self.record(Call::SwitchTab(window_id, tab_id));
        Ok(())
    }

    async fn close_tab(&self, window_id: WindowId, tab_id: TabId) -> Result<(), ProtocolError> {
        self.record(Call::CloseTab(window_id, tab_id));
        Ok(())
    }

    async fn load_url(&self, window_id: WindowId, url: &str) -> Result<(), ProtocolError> {
        self.record(Call::LoadUrl(window_id, url.to_string()));
        Ok(())
    }

    async fn navigate(&self, window_id: WindowId, action: NavAction) -> Result<(), ProtocolError> {
        self.record(Call::Navigate(window_id, action));
        Ok(())
    }

    async fn set_bounds(&self, window_id: WindowId, rect: Rect) -> Result<(), ProtocolError> {
        let pixel = rect
            .to_pixel()
            .ok_or_else(|| ProtocolError::InvalidBounds(format!("{rect:?}")))?;
        self.record(Call::SetBounds(window_id, pixel));
        Ok(())
    }

    async fn set_visibility(
        &self,
        window_id: WindowId,
        visible: bool,
        focused: bool,
    ) -> Result<(), ProtocolError> {
        self.record(Call::SetVisibility(window_id, visible, focused));
        Ok(())
    }

    async fn destroy_view(&self, window_id: WindowId) -> Result<(), ProtocolError> {
        self.record(Call::DestroyView(window_id));
        Ok(())
    }

    async fn capture_snapshot(
        &self,
        window_id: WindowId,
    ) -> Result<Option<SnapshotRef>, ProtocolError> {
        self.record(Call::Capture(window_id));
        let mode = self.capture_mode.lock().unwrap().clone();
        match mode {
            CaptureMode::Succeed => Ok(Some(SnapshotRef::new(800, 600))),
            CaptureMode::Fail => Ok(None),
            CaptureMode::Hang => {
                std::future::pending::<()>().await;
                unreachable!()
            }
            CaptureMode::Gated(notify) => {
                notify.notified().await;
                Ok(Some(SnapshotRef::new(800, 600)))
            }
        }
    }

    async fn show_and_focus(&self, window_id: WindowId) -> Result<(), ProtocolError> {
        self.record(Call::ShowAndFocus(window_id));
        Ok(())
    }

    async fn restack_windows(&self, order: &[StackEntry]) -> Result<(), ProtocolError> {
        self.record(Call::Restack(order.iter().map(|e| e.id).collect()));
        Ok(())
    }
}
