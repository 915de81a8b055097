//! The message-channel contract between the UI process and the view process.
//!
//! Requests are request/response (oneshot acks); events are fire-and-forget.
//! Every payload is a closed, serde-tagged union validated at the boundary:
//! malformed or out-of-range input is rejected before it reaches the
//! registries.

mod events;
mod requests;

pub use events::{SnapshotRef, StackEntry, TabState, ViewEvent, WindowUpdate};
pub use requests::{NavAction, ViewRequest, ViewResponse};
