//! View-process side of the mirador compositor.
//!
//! Owns the native rendering surfaces and their navigation state:
//! - Surface backend abstraction (headless by default, `wry` behind the
//!   `wry-backend` feature)
//! - `ViewRegistry`: `(window, tab) → surface` map and attachment control
//! - `TabManager`: per-window tab collections and navigation commands
//! - `ViewService`: the async message loop the UI process talks to

pub mod backend;
pub mod registry;
pub mod service;
pub mod tabs;

pub use backend::{HeadlessHost, HeadlessProbe, Surface, SurfaceEvent, SurfaceHost};
pub use registry::ViewRegistry;
pub use service::{ViewHandle, ViewService};
pub use tabs::{CloseOutcome, TabManager};
