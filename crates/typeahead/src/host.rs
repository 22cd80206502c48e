//! The surface the controller needs from the host text input.
//!
//! The host owns the real text field and popup list. The controller only
//! reads the text, writes it on commit, samples geometry when it shows the
//! popup and asks who owns focus during the deferred focus check. Everything
//! else a text field does (caret, selection, clipboard, echo character,
//! fonts) stays with the host.

use typeahead_core::{Point, Rect, Size};

use crate::config::PopupMetrics;
use crate::positioner::anchor_point;

/// Which control currently holds keyboard focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusOwner {
    /// The text input itself.
    Input,
    /// The popup's suggestion list.
    SuggestionList,
    /// Some unrelated control.
    Elsewhere,
    /// No control has focus (e.g. the application was deactivated).
    Nothing,
}

impl FocusOwner {
    /// Whether focus is still inside the autocomplete widget.
    pub fn is_within_widget(&self) -> bool {
        matches!(self, FocusOwner::Input | FocusOwner::SuggestionList)
    }
}

/// Geometry sampled from the host each time the popup is shown.
///
/// All rectangles are in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorGeometry {
    /// Bounds of the text input.
    pub input: Rect,
    /// Border width of the text input.
    pub border_width: f32,
    /// Client area of the monitor the input is on.
    pub screen: Rect,
    /// Bounds of the widget hosting the input.
    pub parent: Rect,
}

impl AnchorGeometry {
    /// Where the popup's top-left corner goes when it fits below the input.
    pub fn anchor_point(&self, overlap: f32) -> Point {
        anchor_point(self.input, self.border_width, overlap)
    }
}

/// The host text input, as seen by the autocomplete controller.
///
/// Implementations must not call back into the controller from these
/// methods.
pub trait AssistHost {
    /// Current text of the input.
    fn text(&self) -> String;

    /// Replace the text of the input.
    fn set_text(&mut self, text: &str);

    /// Sample the current anchor geometry.
    fn anchor_geometry(&self) -> AnchorGeometry;

    /// Report which control currently holds focus.
    fn focus_owner(&self) -> FocusOwner;

    /// Whether the host (display, window) has been torn down.
    fn is_disposed(&self) -> bool {
        false
    }

    /// Size the popup will have when showing `items`.
    ///
    /// The default estimates it from `metrics`; hosts with a real list
    /// widget should measure it instead.
    fn measure_popup(&self, items: &[String], anchor: &AnchorGeometry, metrics: &PopupMetrics) -> Size {
        metrics.popup_size(items.len(), anchor.input.width())
    }
}
