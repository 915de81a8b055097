use serde::{Deserialize, Serialize};
use std::fmt;

/// A logical layout rectangle in f64 coordinates. Layout math stays in
/// floating point; surfaces only ever receive [`PixelRect`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Convert to integer pixel coordinates for the surface API.
    ///
    /// Position floors and size ceils so the surface never undershoots the
    /// layout rect (the underlying surface API truncates, which leaves
    /// visible seams). Returns `None` for negative or non-finite extents.
    pub fn to_pixel(&self) -> Option<PixelRect> {
        if !(self.x.is_finite() && self.y.is_finite())
            || !(self.width.is_finite() && self.height.is_finite())
        {
            return None;
        }
        if self.width < 0.0 || self.height < 0.0 {
            return None;
        }
        Some(PixelRect {
            x: self.x.floor() as i32,
            y: self.y.floor() as i32,
            width: self.width.ceil() as u32,
            height: self.height.ceil() as u32,
        })
    }
}

/// Integer pixel rectangle, the only geometry a surface backend sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Identifier for a logical workspace window (a panel, not the OS window).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowId(pub u32);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window-{}", self.0)
    }
}

/// Identifier for one navigable tab within a browser window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TabId(pub u32);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tab-{}", self.0)
    }
}

/// Panel kind. Only `Browser` windows own rendering surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowKind {
    Browser,
    Chat,
    Notes,
}
