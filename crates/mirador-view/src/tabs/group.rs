//! Ordered tab collection for one browser window.

use mirador_common::{TabId, TabState};

/// Outcome of removing a tab from a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabRemoval {
    NotFound,
    /// Removed; if the removed tab was active, `activated` names the new
    /// active tab (left neighbor, or right neighbor if it was leftmost).
    /// `None` when the group is now empty or the active tab didn't change.
    Removed { activated: Option<TabId> },
}

/// The ordered tabs of one window plus the active pointer. Invariant: a
/// non-empty group always has an active tab that is a member.
#[derive(Debug, Clone)]
pub struct TabGroup {
    tabs: Vec<TabState>,
    active: TabId,
}

impl TabGroup {
    pub fn new(first: TabState) -> Self {
        let active = first.id;
        Self {
            tabs: vec![first],
            active,
        }
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn contains(&self, tab_id: TabId) -> bool {
        self.tabs.iter().any(|t| t.id == tab_id)
    }

    pub fn active(&self) -> TabId {
        self.active
    }

    pub fn states(&self) -> &[TabState] {
        &self.tabs
    }

    pub fn state(&self, tab_id: TabId) -> Option<&TabState> {
        self.tabs.iter().find(|t| t.id == tab_id)
    }

    pub fn state_mut(&mut self, tab_id: TabId) -> Option<&mut TabState> {
        self.tabs.iter_mut().find(|t| t.id == tab_id)
    }

    pub fn active_state(&self) -> Option<&TabState> {
        self.state(self.active)
    }

    /// Append a tab and make it active.
    pub fn push(&mut self, state: TabState) {
        self.active = state.id;
        self.tabs.push(state);
    }

    /// Set a specific tab as active. Returns `false` if it is not a member.
    pub fn set_active(&mut self, tab_id: TabId) -> bool {
        if self.contains(tab_id) {
            self.active = tab_id;
            true
        } else {
            false
        }
    }

    /// Remove a tab by id, reassigning the active pointer if needed.
    pub fn remove(&mut self, tab_id: TabId) -> TabRemoval {
        let Some(idx) = self.tabs.iter().position(|t| t.id == tab_id) else {
            return TabRemoval::NotFound;
        };
        let was_active = self.active == tab_id;
        self.tabs.remove(idx);

        if !was_active || self.tabs.is_empty() {
            return TabRemoval::Removed { activated: None };
        }

        // Left neighbor, or the right neighbor (now at `idx`) if leftmost.
        let new_idx = idx.saturating_sub(1);
        self.active = self.tabs[new_idx].id;
        TabRemoval::Removed {
            activated: Some(self.active),
        }
    }
}
