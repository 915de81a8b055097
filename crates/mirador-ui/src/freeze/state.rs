//! The per-window freeze state machine.
//!
//! A single tagged variant with total transition rules, so illegal
//! combinations ("capturing" and "frozen" at once) are unrepresentable.
//! The machine is pure: inputs come in, required surface actions come out,
//! and the async driving lives in [`FreezeCoordinator`].
//!
//! [`FreezeCoordinator`]: super::FreezeCoordinator

use mirador_common::SnapshotRef;

/// Freeze state of one browser window. Never persisted; every window
/// starts `Active` on reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FreezeState {
    /// Live surface visible.
    Active,
    /// Snapshot requested; the surface is still live.
    Capturing,
    /// Snapshot available; the UI must paint it before the surface hides.
    AwaitingRender { snapshot: SnapshotRef },
    /// Snapshot painted; the live surface may be hidden.
    Frozen { snapshot: SnapshotRef },
}

/// Discriminant-only view of [`FreezeState`], for assertions and chrome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreezeStateKind {
    Active,
    Capturing,
    AwaitingRender,
    Frozen,
}

impl FreezeState {
    pub fn kind(&self) -> FreezeStateKind {
        match self {
            FreezeState::Active => FreezeStateKind::Active,
            FreezeState::Capturing => FreezeStateKind::Capturing,
            FreezeState::AwaitingRender { .. } => FreezeStateKind::AwaitingRender,
            FreezeState::Frozen { .. } => FreezeStateKind::Frozen,
        }
    }
}

/// Proof that a capture was started in a particular freeze cycle; a ticket
/// from a finished cycle is stale and its result is discarded.
#[derive(Debug, Clone, Copy)]
pub struct CaptureTicket {
    pub(super) cycle: u64,
}

/// What became of a finished capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// Snapshot stored; the UI should paint it and report back.
    Awaiting(SnapshotRef),
    /// Capture failed or timed out; the live surface stays visible.
    Reverted,
    /// The window returned to `Active` while the capture was in flight;
    /// the result is dropped.
    Stale,
}

/// Surface operation the driver must perform after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreezeAction {
    HideLiveSurface,
    ShowLiveSurface,
}

/// One window's freeze controller: the state plus the single-in-flight
/// operation guard. Only one capture-or-restore may be pending per window;
/// a re-entrant trigger is dropped, not queued, since the state is
/// re-evaluated on the next focus/blur edge regardless.
#[derive(Debug)]
pub struct FreezeController {
    state: FreezeState,
    in_flight: bool,
    cycle: u64,
}

impl FreezeController {
    pub fn new() -> Self {
        Self {
            state: FreezeState::Active,
            in_flight: false,
            cycle: 0,
        }
    }

    pub fn state(&self) -> &FreezeState {
        &self.state
    }

    pub fn kind(&self) -> FreezeStateKind {
        self.state.kind()
    }

    /// Window lost focus while not minimized: `Active → Capturing`.
    /// Returns `None` when the trigger is dropped (an operation is already
    /// in flight, or the window is not `Active`).
    pub fn begin_capture(&mut self) -> Option<CaptureTicket> {
        if self.in_flight || self.state != FreezeState::Active {
            return None;
        }
        self.state = FreezeState::Capturing;
        self.in_flight = true;
        Some(CaptureTicket { cycle: self.cycle })
    }

    /// A capture settled. `snapshot: None` means failure or timeout, which
    /// reverts to `Active` so the window is never left blank.
    pub fn finish_capture(
        &mut self,
        ticket: CaptureTicket,
        snapshot: Option<SnapshotRef>,
    ) -> CaptureOutcome {
        if ticket.cycle != self.cycle {
            return CaptureOutcome::Stale;
        }
        self.in_flight = false;
        if self.state != FreezeState::Capturing {
            return CaptureOutcome::Stale;
        }
        match snapshot {
            Some(snapshot) => {
                self.state = FreezeState::AwaitingRender {
                    snapshot: snapshot.clone(),
                };
                CaptureOutcome::Awaiting(snapshot)
            }
            None => {
                self.state = FreezeState::Active;
                CaptureOutcome::Reverted
            }
        }
    }

    /// The UI confirmed the snapshot finished painting (not a fixed delay,
    /// so there is no flash where neither surface nor snapshot shows).
    pub fn snapshot_painted(&mut self) -> Option<FreezeAction> {
        if let FreezeState::AwaitingRender { snapshot } = &self.state {
            self.state = FreezeState::Frozen {
                snapshot: snapshot.clone(),
            };
            Some(FreezeAction::HideLiveSurface)
        } else {
            None
        }
    }

    /// Window regained focus: any state returns to `Active`. The live
    /// surface is shown at most once per freeze cycle.
    pub fn focus_regained(&mut self) -> Option<FreezeAction> {
        self.cycle += 1;
        self.in_flight = false;
        if self.state == FreezeState::Active {
            return None;
        }
        self.state = FreezeState::Active;
        Some(FreezeAction::ShowLiveSurface)
    }
}

impl Default for FreezeController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> SnapshotRef {
        SnapshotRef::new(800, 600)
    }

    #[test]
    fn full_freeze_round_trip() {
        let mut ctrl = FreezeController::new();
        assert_eq!(ctrl.kind(), FreezeStateKind::Active);

        let ticket = ctrl.begin_capture().unwrap();
        assert_eq!(ctrl.kind(), FreezeStateKind::Capturing);

        let outcome = ctrl.finish_capture(ticket, Some(snapshot()));
        assert!(matches!(outcome, CaptureOutcome::Awaiting(_)));
        assert_eq!(ctrl.kind(), FreezeStateKind::AwaitingRender);

        assert_eq!(ctrl.snapshot_painted(), Some(FreezeAction::HideLiveSurface));
        assert_eq!(ctrl.kind(), FreezeStateKind::Frozen);

        assert_eq!(ctrl.focus_regained(), Some(FreezeAction::ShowLiveSurface));
        assert_eq!(ctrl.kind(), FreezeStateKind::Active);
    }

    #[test]
    fn show_happens_exactly_once_per_cycle() {
        let mut ctrl = FreezeController::new();
        let ticket = ctrl.begin_capture().unwrap();
        ctrl.finish_capture(ticket, Some(snapshot()));
        ctrl.snapshot_painted();

        assert_eq!(ctrl.focus_regained(), Some(FreezeAction::ShowLiveSurface));
        // A second focus edge in the same state produces no second show.
        assert_eq!(ctrl.focus_regained(), None);
    }

    #[test]
    fn failed_capture_reverts_to_active() {
        let mut ctrl = FreezeController::new();
        let ticket = ctrl.begin_capture().unwrap();
        assert_eq!(ctrl.finish_capture(ticket, None), CaptureOutcome::Reverted);
        assert_eq!(ctrl.kind(), FreezeStateKind::Active);
        // The guard is released: a new capture may start.
        assert!(ctrl.begin_capture().is_some());
    }

    #[test]
    fn reentrant_trigger_is_dropped_not_queued() {
        let mut ctrl = FreezeController::new();
        let first = ctrl.begin_capture();
        assert!(first.is_some());
        assert!(ctrl.begin_capture().is_none());
        assert!(ctrl.begin_capture().is_none());
        assert_eq!(ctrl.kind(), FreezeStateKind::Capturing);
    }

    #[test]
    fn focus_from_capturing_returns_to_active() {
        let mut ctrl = FreezeController::new();
        let ticket = ctrl.begin_capture().unwrap();
        assert_eq!(ctrl.focus_regained(), Some(FreezeAction::ShowLiveSurface));
        assert_eq!(ctrl.kind(), FreezeStateKind::Active);

        // The in-flight capture resolves afterwards: stale, ignored.
        let outcome = ctrl.finish_capture(ticket, Some(snapshot()));
        assert_eq!(outcome, CaptureOutcome::Stale);
        assert_eq!(ctrl.kind(), FreezeStateKind::Active);
    }

    #[test]
    fn focus_from_awaiting_render_returns_to_active() {
        let mut ctrl = FreezeController::new();
        let ticket = ctrl.begin_capture().unwrap();
        ctrl.finish_capture(ticket, Some(snapshot()));
        assert_eq!(ctrl.focus_regained(), Some(FreezeAction::ShowLiveSurface));
        // The paint confirmation races in late: no hide.
        assert_eq!(ctrl.snapshot_painted(), None);
    }

    #[test]
    fn stale_ticket_does_not_break_next_cycle() {
        let mut ctrl = FreezeController::new();
        let old = ctrl.begin_capture().unwrap();
        ctrl.focus_regained();

        // Next blur starts a new cycle while the old capture is unresolved.
        let fresh = ctrl.begin_capture().unwrap();
        assert_eq!(
            ctrl.finish_capture(old, Some(snapshot())),
            CaptureOutcome::Stale
        );
        // The old result must not have cleared the new cycle's guard.
        assert!(ctrl.begin_capture().is_none());
        assert!(matches!(
            ctrl.finish_capture(fresh, Some(snapshot())),
            CaptureOutcome::Awaiting(_)
        ));
    }

    #[test]
    fn painted_in_wrong_state_is_ignored() {
        let mut ctrl = FreezeController::new();
        assert_eq!(ctrl.snapshot_painted(), None);
        ctrl.begin_capture();
        assert_eq!(ctrl.snapshot_painted(), None);
    }
}
