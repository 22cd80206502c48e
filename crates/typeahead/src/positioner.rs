//! Placement of the suggestion popup relative to its input field.
//!
//! [`place`] is a pure function: it takes the anchor point, the popup size
//! and the bounds it has to respect, and returns where the popup should go.
//! It never renders or moves anything.
//!
//! The popup is placed just below the input. If that would run past the
//! bottom of the screen it flips above the parent; if it would run past the
//! right edge it is pulled left. The top and left screen edges are not
//! checked, so a flipped popup taller than the space above the parent (or a
//! popup wider than the screen) can still end up partly off-screen.

use typeahead_core::logging::targets;
use typeahead_core::{Point, Rect, Size};

/// Default number of pixels the popup overlaps the input's bottom edge, so
/// that the two borders touch.
pub const DEFAULT_POPUP_OVERLAP: f32 = 3.0;

/// The computed placement of the popup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Top-left corner of the popup in screen coordinates.
    pub origin: Point,
    /// Size of the popup that was placed.
    pub size: Size,
    /// The popup did not fit below the anchor and was moved above the parent.
    pub flipped_above: bool,
    /// The popup was pulled left to stay within the screen's right edge.
    pub clamped_right: bool,
}

impl Placement {
    /// The popup rectangle in screen coordinates.
    pub fn rect(&self) -> Rect {
        Rect {
            origin: self.origin,
            size: self.size,
        }
    }
}

/// Compute the default anchor point for an input rectangle.
///
/// This is the bottom-left corner of `input`, pushed down by the input's
/// border width and pulled up by `overlap`.
pub fn anchor_point(input: Rect, border_width: f32, overlap: f32) -> Point {
    Point::new(input.left(), input.bottom() + border_width - overlap)
}

/// Place a popup of `overlay` size anchored at `anchor`.
///
/// - `screen` is the client area of the monitor the input is on.
/// - `parent` is the bounds of the widget hosting the input, in screen
///   coordinates; its top edge is used when the popup flips above.
pub fn place(anchor: Point, overlay: Size, screen: Rect, parent: Rect) -> Placement {
    let mut x = anchor.x;
    let mut y = anchor.y;
    let mut flipped_above = false;
    let mut clamped_right = false;

    if y + overlay.height > screen.bottom() {
        y = parent.top() - overlay.height;
        flipped_above = true;
    }
    if x + overlay.width > screen.right() {
        x = screen.right() - overlay.width;
        clamped_right = true;
    }

    tracing::trace!(
        target: targets::POSITIONER,
        x,
        y,
        width = overlay.width,
        height = overlay.height,
        flipped_above,
        clamped_right,
        "placed popup"
    );

    Placement {
        origin: Point::new(x, y),
        size: overlay,
        flipped_above,
        clamped_right,
    }
}
