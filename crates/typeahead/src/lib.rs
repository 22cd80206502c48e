//! Typeahead - autocomplete for text inputs.
//!
//! This is the main crate: it re-exports the core systems from
//! `typeahead-core` and adds the autocomplete controller on top of them.
//!
//! The pieces, leaves first:
//!
//! - [`provider`]: the [`SuggestionProvider`] contract and ready-made providers
//! - [`positioner`]: pure placement of the popup relative to its input
//! - [`navigation`]: the keyboard state machine for the open popup
//! - [`controller`]: [`AutocompleteController`], which ties them together
//!
//! Hosts implement [`AssistHost`] for their text field, forward events to the
//! controller (one `on_*` handler per [`AssistMessage`]) and mirror its
//! [`AssistSignals`] into their popup list.
//!
//! # Example
//!
//! ```no_run
//! use typeahead::prelude::*;
//!
//! fn wire<H: AssistHost + 'static>(field: H, event_loop: &EventLoop) -> AutocompleteController<H> {
//!     let provider = CachingProvider::new(StringListProvider::from(vec!["apple", "apricot"]));
//!     let controller = AutocompleteController::new(field, provider, event_loop);
//!     controller.signals().committed.connect(|text| {
//!         println!("completed to {text}");
//!     });
//!     controller
//! }
//! ```

pub use typeahead_core::*;

pub mod background;
pub mod config;
pub mod controller;
pub mod error;
pub mod host;
pub mod message;
pub mod navigation;
pub mod popup;
pub mod positioner;
pub mod prelude;
pub mod provider;

pub use background::{BackgroundProvider, SuggestionResponse};
pub use config::{AssistConfig, PopupMetrics};
pub use controller::{AssistSignals, AutocompleteController, PopupUpdate};
pub use error::{AssistError, ConfigError, ProviderError, Result};
pub use host::{AnchorGeometry, AssistHost, FocusOwner};
pub use message::AssistMessage;
pub use navigation::{Key, KeyDisposition, NavState};
pub use popup::PopupState;
pub use positioner::{Placement, place};
pub use provider::{CachingProvider, CaseSensitivity, StringListProvider, SuggestionProvider, from_fn};
