//! Freeze/unfreeze driving against the view bridge.
//!
//! [`FreezeController`] is the pure per-window state machine;
//! [`FreezeCoordinator`] owns one controller per browser window, runs
//! captures with a bounded timeout, and applies the resulting surface
//! operations. Controllers are scoped per window, so operations on
//! different windows never contend.

mod state;

pub use state::{
    CaptureOutcome, CaptureTicket, FreezeAction, FreezeController, FreezeState, FreezeStateKind,
};

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use mirador_common::{SnapshotRef, ViewBridge, WindowId};

pub const DEFAULT_CAPTURE_TIMEOUT: Duration = Duration::from_secs(5);

/// Tells the chrome layer a snapshot is ready to paint; it must answer with
/// [`FreezeCoordinator::snapshot_painted`] once the paint lands.
#[derive(Debug, Clone)]
pub struct FreezeNotice {
    pub window_id: WindowId,
    pub snapshot: SnapshotRef,
}

#[derive(Clone)]
pub struct FreezeCoordinator {
    bridge: Arc<dyn ViewBridge>,
    windows: Arc<Mutex<HashMap<WindowId, FreezeController>>>,
    capture_timeout: Duration,
    notice_tx: mpsc::Sender<FreezeNotice>,
}

impl FreezeCoordinator {
    pub fn new(
        bridge: Arc<dyn ViewBridge>,
        capture_timeout: Duration,
    ) -> (Self, mpsc::Receiver<FreezeNotice>) {
        let (notice_tx, notice_rx) = mpsc::channel(64);
        (
            Self {
                bridge,
                windows: Arc::new(Mutex::new(HashMap::new())),
                capture_timeout,
                notice_tx,
            },
            notice_rx,
        )
    }

    /// Discriminant of a window's freeze state. An untracked window is
    /// `Active`; freeze state is never persisted, so that is the reload
    /// default.
    pub fn state_kind(&self, window_id: WindowId) -> FreezeStateKind {
        self.windows
            .lock()
            .unwrap()
            .get(&window_id)
            .map(|c| c.kind())
            .unwrap_or(FreezeStateKind::Active)
    }

    pub fn is_frozen(&self, window_id: WindowId) -> bool {
        self.state_kind(window_id) == FreezeStateKind::Frozen
    }

    /// Drop tracking for a closed window.
    pub fn remove(&self, window_id: WindowId) {
        self.windows.lock().unwrap().remove(&window_id);
    }

    /// Window lost focus. Minimizing takes the plain hide path and never
    /// needs a snapshot; minimized windows are not being dragged over.
    pub async fn handle_blur(&self, window_id: WindowId, is_minimized: bool) {
        if is_minimized {
            return;
        }
        let ticket = {
            let mut windows = self.windows.lock().unwrap();
            windows.entry(window_id).or_default().begin_capture()
        };
        let Some(ticket) = ticket else {
            debug!(%window_id, "capture trigger dropped");
            return;
        };

        let snapshot =
            match tokio::time::timeout(self.capture_timeout, self.bridge.capture_snapshot(window_id))
                .await
            {
                Ok(Ok(snapshot)) => snapshot,
                Ok(Err(e)) => {
                    warn!(%window_id, error = %e, "snapshot capture failed");
                    None
                }
                Err(_) => {
                    warn!(%window_id, timeout = ?self.capture_timeout, "snapshot capture timed out");
                    None
                }
            };

        let outcome = {
            let mut windows = self.windows.lock().unwrap();
            match windows.get_mut(&window_id) {
                Some(ctrl) => ctrl.finish_capture(ticket, snapshot),
                None => CaptureOutcome::Stale,
            }
        };
        match outcome {
            CaptureOutcome::Awaiting(snapshot) => {
                let _ = self
                    .notice_tx
                    .send(FreezeNotice {
                        window_id,
                        snapshot,
                    })
                    .await;
            }
            CaptureOutcome::Reverted => {
                debug!(%window_id, "capture reverted, surface stays live");
            }
            CaptureOutcome::Stale => {
                debug!(%window_id, "stale capture result dropped");
            }
        }
    }

    /// The chrome finished painting the snapshot; the live surface may now
    /// hide. Errors here are background failures: absorbed and logged.
    pub async fn snapshot_painted(&self, window_id: WindowId) {
        let action = {
            let mut windows = self.windows.lock().unwrap();
            windows
                .get_mut(&window_id)
                .and_then(|ctrl| ctrl.snapshot_painted())
        };
        if action == Some(FreezeAction::HideLiveSurface) {
            if let Err(e) = self.bridge.set_visibility(window_id, false, false).await {
                warn!(%window_id, error = %e, "failed to hide frozen surface");
            }
        }
    }

    /// Window regained focus: show the live surface and give it input
    /// focus, once per freeze cycle.
    pub async fn handle_focus(&self, window_id: WindowId) {
        let action = {
            let mut windows = self.windows.lock().unwrap();
            windows.entry(window_id).or_default().focus_regained()
        };
        if action == Some(FreezeAction::ShowLiveSurface) {
            if let Err(e) = self.bridge.show_and_focus(window_id).await {
                warn!(%window_id, error = %e, "failed to restore live surface");
            }
        }
    }
}
