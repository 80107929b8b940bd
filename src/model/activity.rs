use serde::{Deserialize, Serialize};

use crate::sys::window::WindowId;

/// Last focused window and last focused browser window, per grid index.
///
/// Writes to an index outside the table are ignored.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ActivityTable {
    active: Vec<Option<WindowId>>,
    browser: Vec<Option<WindowId>>,
}

impl ActivityTable {
    pub fn new(len: usize) -> ActivityTable {
        ActivityTable {
            active: vec![None; len],
            browser: vec![None; len],
        }
    }

    pub fn len(&self) -> usize { self.active.len() }

    pub fn is_empty(&self) -> bool { self.active.is_empty() }

    pub fn active(&self, index: usize) -> Option<WindowId> { self.active.get(index).copied().flatten() }

    pub fn browser(&self, index: usize) -> Option<WindowId> { self.browser.get(index).copied().flatten() }

    pub fn set_active(&mut self, index: usize, window: Option<WindowId>) {
        if let Some(slot) = self.active.get_mut(index) {
            *slot = window;
        }
    }

    pub fn set_browser(&mut self, index: usize, window: Option<WindowId>) {
        if let Some(slot) = self.browser.get_mut(index) {
            *slot = window;
        }
    }

    /// Clears every active slot that names `window`.
    pub fn forget_active(&mut self, window: WindowId) {
        for slot in self.active.iter_mut().filter(|slot| **slot == Some(window)) {
            *slot = None;
        }
    }

    /// Clears every browser slot that names `window`; returns the indices cleared.
    pub fn forget_browser(&mut self, window: WindowId) -> Vec<usize> {
        let mut cleared = Vec::new();
        for (index, slot) in self.browser.iter_mut().enumerate() {
            if *slot == Some(window) {
                *slot = None;
                cleared.push(index);
            }
        }
        cleared
    }

    pub fn active_slots(&self) -> &[Option<WindowId>] { &self.active }

    pub fn browser_slots(&self) -> &[Option<WindowId>] { &self.browser }
}
