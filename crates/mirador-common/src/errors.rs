use std::path::PathBuf;

use crate::types::{TabId, WindowId};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),

    #[error("config watch error: {0}")]
    WatchError(String),
}

/// Errors rejected at the message-channel boundary, before any command
/// reaches the view process.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("url is empty")]
    EmptyUrl,

    #[error("invalid bounds: {0}")]
    InvalidBounds(String),

    #[error("unknown window: {0}")]
    UnknownWindow(WindowId),

    #[error("unknown tab: {0}")]
    UnknownTab(TabId),

    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("view channel closed")]
    ChannelClosed,

    #[error("request timed out")]
    Timeout,
}

#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("surface backend error: {0}")]
    Backend(String),

    #[error("surface crashed")]
    Crashed,

    #[error("capture not supported by this backend")]
    CaptureUnsupported,

    #[error("surface not attached")]
    NotAttached,
}

#[derive(Debug, thiserror::Error)]
pub enum MiradorError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Surface(#[from] SurfaceError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("{0}")]
    Other(String),
}
