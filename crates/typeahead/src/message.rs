//! Typed input events for the autocomplete controller.

use crate::navigation::Key;

/// An event delivered to [`AutocompleteController::dispatch`].
///
/// Each variant has a matching `on_*` handler on the controller; hosts may
/// call those directly instead.
///
/// [`AutocompleteController::dispatch`]: crate::AutocompleteController::dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssistMessage {
    /// The input text changed (keystroke, paste, programmatic set).
    TextChanged(String),
    /// A key was pressed in the input.
    KeyPressed(Key),
    /// The input lost keyboard focus.
    FocusLost,
    /// The window hosting the input moved or was resized.
    HostMoved,
    /// The user accepted an item in the popup list (double-click or the
    /// list's own Enter handling).
    ItemCommitted(usize),
    /// The pointer moved over an item in the popup list.
    ItemHovered(usize),
}

impl AssistMessage {
    /// Short name used in log output.
    pub fn kind(&self) -> &'static str {
        match self {
            AssistMessage::TextChanged(_) => "text_changed",
            AssistMessage::KeyPressed(_) => "key_pressed",
            AssistMessage::FocusLost => "focus_lost",
            AssistMessage::HostMoved => "host_moved",
            AssistMessage::ItemCommitted(_) => "item_committed",
            AssistMessage::ItemHovered(_) => "item_hovered",
        }
    }
}

impl From<Key> for AssistMessage {
    fn from(key: Key) -> Self {
        AssistMessage::KeyPressed(key)
    }
}
