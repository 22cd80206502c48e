//! Prelude module for Typeahead.
//!
//! ```ignore
//! use typeahead::prelude::*;
//! ```
//!
//! This provides access to:
//! - The controller and its host contract
//! - Providers
//! - Keys and navigation state
//! - Geometry types and the event loop

// ============================================================================
// Controller
// ============================================================================

pub use crate::controller::{AssistSignals, AutocompleteController, PopupUpdate};
pub use crate::host::{AnchorGeometry, AssistHost, FocusOwner};
pub use crate::message::AssistMessage;

// ============================================================================
// Providers
// ============================================================================

pub use crate::background::BackgroundProvider;
pub use crate::provider::{CachingProvider, CaseSensitivity, StringListProvider, SuggestionProvider, from_fn};

// ============================================================================
// Navigation and Placement
// ============================================================================

pub use crate::navigation::{Key, KeyDisposition, NavState};
pub use crate::positioner::Placement;

// ============================================================================
// Configuration and Errors
// ============================================================================

pub use crate::config::{AssistConfig, PopupMetrics};
pub use crate::error::{AssistError, ProviderError};

// ============================================================================
// Core
// ============================================================================

pub use typeahead_core::{EventLoop, LoopHandle, Point, Rect, Signal, Size};
