//! Keyboard navigation state machine for the suggestion popup.
//!
//! The machine has three states: [`NavState::Closed`],
//! [`NavState::OpenNoSelection`] and [`NavState::OpenWithSelection`]. While
//! closed, every key passes through to normal text editing. While open:
//!
//! | Key | Effect |
//! |---|---|
//! | ArrowDown | select next item, wrapping to the first; suppress the key |
//! | ArrowUp | select previous item, wrapping to the last; suppress the key |
//! | Enter | commit the selected item (no-op without a selection) |
//! | Escape | close without committing |
//!
//! Starting from no selection, ArrowDown selects the first item and ArrowUp
//! the last.

/// Keys the autocomplete controller understands.
///
/// Hosts map their native key codes onto this enum; anything the navigation
/// machine does not care about can be passed as [`Key::Character`] or
/// [`Key::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Home,
    End,
    PageUp,
    PageDown,
    Enter,
    NumpadEnter,
    Escape,
    Tab,
    Backspace,
    Delete,
    /// A printable character.
    Character(char),
    /// Any other key, by host key code.
    Other(u32),
}

impl Key {
    /// Check if this key confirms a selection.
    pub fn is_enter(&self) -> bool {
        matches!(self, Key::Enter | Key::NumpadEnter)
    }
}

/// Whether the host should still apply its default handling for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyDisposition {
    /// Let the text input handle the key as usual.
    #[default]
    Propagate,
    /// The popup consumed the key; the text input must ignore it.
    Suppress,
}

impl KeyDisposition {
    pub fn is_suppressed(&self) -> bool {
        matches!(self, KeyDisposition::Suppress)
    }
}

/// Popup navigation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NavState {
    /// Popup hidden; keys pass through.
    #[default]
    Closed,
    /// Popup shown, nothing highlighted yet.
    OpenNoSelection,
    /// Popup shown with the given item highlighted.
    OpenWithSelection(usize),
}

impl NavState {
    /// Derive the state from popup visibility and selection.
    pub fn from_popup(visible: bool, selected: Option<usize>) -> Self {
        match (visible, selected) {
            (false, _) => NavState::Closed,
            (true, None) => NavState::OpenNoSelection,
            (true, Some(index)) => NavState::OpenWithSelection(index),
        }
    }

    pub fn is_open(&self) -> bool {
        !matches!(self, NavState::Closed)
    }

    /// The highlighted index, if any.
    pub fn selected(&self) -> Option<usize> {
        match self {
            NavState::OpenWithSelection(index) => Some(*index),
            _ => None,
        }
    }
}

/// What the controller must do as a result of a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavAction {
    /// Nothing to do.
    None,
    /// Highlight the item at this index.
    Select(usize),
    /// Commit the item at this index and close.
    Commit(usize),
    /// Close without committing.
    Dismiss,
}

/// Result of feeding one key to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next: NavState,
    pub action: NavAction,
    pub disposition: KeyDisposition,
}

impl Transition {
    fn stay(state: NavState) -> Self {
        Self {
            next: state,
            action: NavAction::None,
            disposition: KeyDisposition::Propagate,
        }
    }
}

/// Compute the transition for `key` in `state`, with `item_count` items shown.
pub fn transition(state: NavState, key: Key, item_count: usize) -> Transition {
    // An open popup always has items; treat anything else as closed.
    if !state.is_open() || item_count == 0 {
        return Transition::stay(NavState::Closed);
    }

    // A stale index past the end counts as no selection.
    let selected = state.selected().filter(|&index| index < item_count);

    match key {
        Key::ArrowDown => {
            let index = selected.map_or(0, |i| (i + 1) % item_count);
            Transition {
                next: NavState::OpenWithSelection(index),
                action: NavAction::Select(index),
                disposition: KeyDisposition::Suppress,
            }
        }
        Key::ArrowUp => {
            let index = selected.map_or(item_count - 1, |i| (i + item_count - 1) % item_count);
            Transition {
                next: NavState::OpenWithSelection(index),
                action: NavAction::Select(index),
                disposition: KeyDisposition::Suppress,
            }
        }
        key if key.is_enter() => match selected {
            Some(index) => Transition {
                next: NavState::Closed,
                action: NavAction::Commit(index),
                disposition: KeyDisposition::Propagate,
            },
            None => Transition::stay(NavState::OpenNoSelection),
        },
        Key::Escape => Transition {
            next: NavState::Closed,
            action: NavAction::Dismiss,
            disposition: KeyDisposition::Propagate,
        },
        _ => Transition::stay(NavState::from_popup(true, selected)),
    }
}
