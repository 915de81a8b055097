//! The UI-process window metadata store.
//!
//! Single owner of all [`Window`] records. Focus raises a window to the top
//! of the z order; stacking iteration is deterministic (stable sort over a
//! BTreeMap) so equal-priority windows never thrash position between
//! restack calls.

mod types;

pub use types::{BrowserState, TabRecord, Window};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use mirador_common::{Rect, WindowId, WindowKind};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct WindowStore {
    windows: BTreeMap<u32, Window>,
    next_id: u32,
    next_z: u32,
}

impl WindowStore {
    pub fn new() -> Self {
        Self {
            windows: BTreeMap::new(),
            next_id: 1,
            next_z: 1,
        }
    }

    pub fn open(&mut self, kind: WindowKind, bounds: Rect) -> WindowId {
        let id = WindowId(self.next_id);
        self.next_id += 1;
        self.next_z += 1;
        let browser = (kind == WindowKind::Browser).then(BrowserState::default);
        self.windows.insert(
            id.0,
            Window {
                id,
                kind,
                bounds,
                z_index: self.next_z,
                is_focused: false,
                is_minimized: false,
                browser,
            },
        );
        id
    }

    pub fn close(&mut self, id: WindowId) -> Option<Window> {
        self.windows.remove(&id.0)
    }

    pub fn get(&self, id: WindowId) -> Option<&Window> {
        self.windows.get(&id.0)
    }

    pub fn get_mut(&mut self, id: WindowId) -> Option<&mut Window> {
        self.windows.get_mut(&id.0)
    }

    pub fn browser_mut(&mut self, id: WindowId) -> Option<&mut BrowserState> {
        self.windows.get_mut(&id.0)?.browser.as_mut()
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn contains(&self, id: WindowId) -> bool {
        self.windows.contains_key(&id.0)
    }

    pub fn focused(&self) -> Option<WindowId> {
        self.windows
            .values()
            .find(|w| w.is_focused)
            .map(|w| w.id)
    }

    /// Focus a window: it gains the top z slot, everything else blurs.
    /// Returns the previously focused window, if any and different.
    pub fn focus(&mut self, id: WindowId) -> Option<WindowId> {
        if !self.windows.contains_key(&id.0) {
            return None;
        }
        let previous = self.focused().filter(|p| *p != id);
        self.next_z += 1;
        let next_z = self.next_z;
        for window in self.windows.values_mut() {
            window.is_focused = window.id == id;
            if window.id == id {
                window.z_index = next_z;
                window.is_minimized = false;
            }
        }
        previous
    }

    pub fn blur_all(&mut self) {
        for window in self.windows.values_mut() {
            window.is_focused = false;
        }
    }

    pub fn set_bounds(&mut self, id: WindowId, bounds: Rect) -> bool {
        match self.windows.get_mut(&id.0) {
            Some(window) => {
                window.bounds = bounds;
                true
            }
            None => false,
        }
    }

    pub fn set_minimized(&mut self, id: WindowId, minimized: bool) -> bool {
        match self.windows.get_mut(&id.0) {
            Some(window) => {
                window.is_minimized = minimized;
                if minimized {
                    window.is_focused = false;
                }
                true
            }
            None => false,
        }
    }

    /// Windows in ascending z order. The sort is stable over id order, so
    /// ties keep their relative position.
    pub fn stacking_order(&self) -> Vec<&Window> {
        let mut ordered: Vec<&Window> = self.windows.values().collect();
        ordered.sort_by_key(|w| w.z_index);
        ordered
    }

    pub fn iter(&self) -> impl Iterator<Item = &Window> {
        self.windows.values()
    }

    /// Serialize for the persisted-layout store. Freeze state and surface
    /// handles are never part of this.
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}
