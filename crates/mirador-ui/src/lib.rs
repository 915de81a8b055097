//! UI-process side of the mirador compositor.
//!
//! Owns layout, user input routing, and persisted window metadata:
//! - `WindowStore`: the authoritative store of logical windows
//! - `BoundsSynchronizer`: debounced geometry + stacking-order push
//! - `FreezeController` / `FreezeCoordinator`: the snapshot state machine
//! - `StateReconciler`: merges authoritative view-process state
//! - `LayoutStore`: async key/value persistence for window metadata
//! - `WorkspaceController`: the composition of all of the above

pub mod bounds;
pub mod controller;
pub mod freeze;
pub mod persist;
pub mod reconcile;
pub mod windows;

#[cfg(test)]
pub(crate) mod testing;

pub use bounds::{BoundsSynchronizer, ChromeInsets};
pub use controller::{HostEvent, WorkspaceController};
pub use freeze::{FreezeCoordinator, FreezeNotice, FreezeStateKind};
pub use persist::{JsonFileStore, LayoutStore, MemoryStore};
pub use reconcile::{ReconcileEffect, StateReconciler};
pub use windows::{BrowserState, TabRecord, Window, WindowStore};
