pub mod bridge;
pub mod errors;
pub mod events;
pub mod id;
pub mod protocol;
pub mod types;
pub mod url;

pub use bridge::ViewBridge;
pub use errors::{ConfigError, MiradorError, ProtocolError, SurfaceError};
pub use events::{Event, EventBus};
pub use id::{new_correlation_id, new_id};
pub use protocol::{
    NavAction, SnapshotRef, StackEntry, TabState, ViewEvent, ViewRequest, ViewResponse,
    WindowUpdate,
};
pub use types::{PixelRect, Rect, TabId, WindowId, WindowKind};
pub use url::normalize_url;

pub type Result<T> = std::result::Result<T, MiradorError>;
