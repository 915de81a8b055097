//! Geometry and stacking synchronization toward the view process.
//!
//! Layout changes are queued and flushed at most once per frame tick, so a
//! continuous drag coalesces to one emission per frame; an unchanged rect
//! is skipped entirely to keep idle re-renders off the channel. Visibility
//! on focus change bypasses the batch: hiding a defocused surface must not
//! lag the focus edge or stale content becomes visible.

use std::collections::HashMap;

use tracing::{debug, warn};

use mirador_common::{PixelRect, Rect, StackEntry, ViewBridge, WindowId};

use crate::windows::Window;

/// Chrome insets carved out of a window's bounds before the surface rect
/// is derived: the surface sits below the title bar and tab strip, inside
/// the border.
#[derive(Debug, Clone, Copy)]
pub struct ChromeInsets {
    pub title_bar: f64,
    pub tab_strip: f64,
    pub sidebar_left: f64,
    pub border: f64,
}

impl Default for ChromeInsets {
    fn default() -> Self {
        Self {
            title_bar: 38.0,
            tab_strip: 34.0,
            sidebar_left: 0.0,
            border: 1.0,
        }
    }
}

impl ChromeInsets {
    /// The rectangle the active surface occupies within a window.
    pub fn content_rect(&self, bounds: Rect) -> Rect {
        let top = self.title_bar + self.tab_strip + self.border;
        let left = self.sidebar_left + self.border;
        Rect {
            x: bounds.x + left,
            y: bounds.y + top,
            width: (bounds.width - left - self.border).max(0.0),
            height: (bounds.height - top - self.border).max(0.0),
        }
    }
}

pub struct BoundsSynchronizer {
    insets: ChromeInsets,
    pending: HashMap<WindowId, Rect>,
    last_sent: HashMap<WindowId, PixelRect>,
}

impl BoundsSynchronizer {
    pub fn new(insets: ChromeInsets) -> Self {
        Self {
            insets,
            pending: HashMap::new(),
            last_sent: HashMap::new(),
        }
    }

    pub fn insets(&self) -> &ChromeInsets {
        &self.insets
    }

    /// Queue the surface rect derived from a window's bounds. Within one
    /// frame only the last queued rect survives.
    pub fn queue(&mut self, window_id: WindowId, window_bounds: Rect) {
        self.pending
            .insert(window_id, self.insets.content_rect(window_bounds));
    }

    /// Stop tracking a closed window.
    pub fn forget(&mut self, window_id: WindowId) {
        self.pending.remove(&window_id);
        self.last_sent.remove(&window_id);
    }

    /// Flush queued geometry, skipping rects identical to the last sent.
    /// Called once per frame tick. Returns how many rects went out.
    pub async fn flush(&mut self, bridge: &dyn ViewBridge) -> usize {
        let pending = std::mem::take(&mut self.pending);
        let mut sent = 0;
        for (window_id, rect) in pending {
            let Some(pixel) = rect.to_pixel() else {
                warn!(%window_id, ?rect, "dropping invalid surface rect");
                continue;
            };
            if self.last_sent.get(&window_id) == Some(&pixel) {
                continue;
            }
            match bridge.set_bounds(window_id, rect).await {
                Ok(()) => {
                    self.last_sent.insert(window_id, pixel);
                    sent += 1;
                }
                Err(e) => {
                    // Retried on the next layout change; geometry converges
                    // eventually rather than delivering every intermediate.
                    warn!(%window_id, error = %e, "failed to push surface bounds");
                }
            }
        }
        sent
    }

    /// Push visibility synchronously on a focus edge, bypassing the batch.
    pub async fn sync_focus(
        &self,
        bridge: &dyn ViewBridge,
        window_id: WindowId,
        visible: bool,
        focused: bool,
    ) {
        if let Err(e) = bridge.set_visibility(window_id, visible, focused).await {
            warn!(%window_id, error = %e, "failed to push surface visibility");
        }
    }

    /// Stacking entries for the view process, ascending z order. Only
    /// browser windows occupy surface slots.
    pub fn stack_entries<'a>(
        windows_ascending: impl Iterator<Item = &'a Window>,
        is_frozen: impl Fn(WindowId) -> bool,
    ) -> Vec<StackEntry> {
        windows_ascending
            .filter(|w| w.is_browser())
            .map(|w| StackEntry {
                id: w.id,
                is_frozen: is_frozen(w.id),
                is_minimized: w.is_minimized,
            })
            .collect()
    }

    /// Push a stacking order. Restack failures are background errors:
    /// absorbed and logged.
    pub async fn push_stack(&self, bridge: &dyn ViewBridge, entries: &[StackEntry]) {
        if entries.is_empty() {
            return;
        }
        debug!(count = entries.len(), "pushing stacking order");
        if let Err(e) = bridge.restack_windows(entries).await {
            warn!(error = %e, "failed to push stacking order");
        }
    }
}
