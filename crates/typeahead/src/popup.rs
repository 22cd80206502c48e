//! State of the suggestion popup.

use crate::navigation::NavState;
use crate::positioner::Placement;

/// Visibility, items and selection of the suggestion popup.
///
/// Owned exclusively by the controller. When the popup is hidden, `items`
/// still holds the last list shown but is stale. The selection always points
/// inside `items` when set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PopupState {
    visible: bool,
    items: Vec<String>,
    selected: Option<usize>,
    placement: Option<Placement>,
}

impl PopupState {
    /// Create a hidden, empty popup state.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Items of the current (or last shown) list.
    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Highlighted index, `None` when nothing is highlighted.
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// The highlighted item, if the popup is visible and has a selection.
    pub fn selected_item(&self) -> Option<&str> {
        if !self.visible {
            return None;
        }
        self.selected
            .and_then(|index| self.items.get(index))
            .map(String::as_str)
    }

    /// Where the popup was last placed.
    pub fn placement(&self) -> Option<Placement> {
        self.placement
    }

    /// Navigation state derived from visibility and selection.
    pub fn nav_state(&self) -> NavState {
        NavState::from_popup(self.visible, self.selected)
    }

    /// Replace the items, clear the selection and show the popup.
    pub fn show(&mut self, items: Vec<String>, placement: Placement) {
        self.items = items;
        self.selected = None;
        self.placement = Some(placement);
        self.visible = true;
    }

    /// Hide the popup.
    ///
    /// Returns `true` if it was visible before.
    pub fn hide(&mut self) -> bool {
        let was_visible = self.visible;
        self.visible = false;
        self.selected = None;
        was_visible
    }

    /// Highlight `index`.
    ///
    /// Returns `false` (and leaves the selection alone) when the popup is
    /// hidden or `index` is out of range.
    pub fn select(&mut self, index: usize) -> bool {
        if !self.visible || index >= self.items.len() {
            return false;
        }
        self.selected = Some(index);
        true
    }

    /// The item at `index`, if the popup is visible and the index is valid.
    pub fn item(&self, index: usize) -> Option<&str> {
        if !self.visible {
            return None;
        }
        self.items.get(index).map(String::as_str)
    }
}
