//! The autocomplete controller.
//!
//! [`AutocompleteController`] is the single source of truth for the
//! suggestion popup. It turns host events into provider lookups, popup
//! placement and navigation, and decides when the popup closes:
//!
//! - text changes fetch fresh candidates (empty text or no candidates hides
//!   the popup)
//! - arrow keys move the highlight while the popup is open
//! - Enter or an explicit commit copies the highlighted item into the input
//! - Escape, a host move or focus leaving the widget hides the popup
//!
//! Focus loss is not handled inline. When the input loses focus the new focus
//! owner may not be known yet (focus could be moving into the popup's own
//! list), so the check is posted to the event loop and runs on its next turn.
//!
//! # Example
//!
//! ```
//! use typeahead::prelude::*;
//!
//! struct Field {
//!     text: String,
//! }
//!
//! impl AssistHost for Field {
//!     fn text(&self) -> String {
//!         self.text.clone()
//!     }
//!     fn set_text(&mut self, text: &str) {
//!         self.text = text.to_string();
//!     }
//!     fn anchor_geometry(&self) -> AnchorGeometry {
//!         AnchorGeometry {
//!             input: Rect::new(10.0, 10.0, 200.0, 24.0),
//!             border_width: 1.0,
//!             screen: Rect::new(0.0, 0.0, 1280.0, 800.0),
//!             parent: Rect::new(0.0, 0.0, 400.0, 300.0),
//!         }
//!     }
//!     fn focus_owner(&self) -> FocusOwner {
//!         FocusOwner::Input
//!     }
//! }
//!
//! let event_loop = EventLoop::new();
//! let fruits = StringListProvider::from(vec!["apple", "apricot", "banana"]);
//! let controller =
//!     AutocompleteController::new(Field { text: String::new() }, fruits, &event_loop);
//!
//! controller.on_text_changed("ap");
//! assert_eq!(controller.items(), vec!["apple", "apricot"]);
//!
//! controller.on_key_pressed(Key::ArrowDown);
//! controller.on_key_pressed(Key::Enter);
//! assert_eq!(controller.with_host(|field| field.text.clone()), "apple");
//! assert!(!controller.is_popup_visible());
//! ```

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::{Duration, Instant};

use typeahead_core::logging::targets;
use typeahead_core::{EventLoop, LivenessFlag, LoopHandle, Signal, TaskId};

use crate::background::{BackgroundProvider, SuggestionResponse};
use crate::config::AssistConfig;
use crate::error::{AssistError, ConfigError, ProviderError, Result};
use crate::host::AssistHost;
use crate::message::AssistMessage;
use crate::navigation::{self, Key, KeyDisposition, NavAction, NavState};
use crate::popup::PopupState;
use crate::positioner::{Placement, place};
use crate::provider::{SuggestionProvider, call_provider};

/// The list handed to the host popup whenever it is (re)filled.
#[derive(Debug, Clone, PartialEq)]
pub struct PopupUpdate {
    pub items: Vec<String>,
    pub placement: Placement,
}

/// Signals emitted by an [`AutocompleteController`].
///
/// Slots run after the controller has finished updating its state, so they
/// may query it freely. They must not feed new events back into it.
#[derive(Debug, Default)]
pub struct AssistSignals {
    /// Emitted with `true` when the popup opens and `false` when it closes.
    pub visibility_changed: Signal<bool>,
    /// Emitted with the new list and placement every time the popup is filled.
    pub items_changed: Signal<PopupUpdate>,
    /// Emitted with the index and text of the newly highlighted item.
    pub highlighted: Signal<(usize, String)>,
    /// Emitted with the committed text after it was written to the input.
    pub committed: Signal<String>,
}

/// Where suggestions come from.
enum SuggestionSource {
    Inline(Box<dyn SuggestionProvider>),
    Background(BackgroundProvider),
}

/// A state change to announce once the state borrow is released.
enum Notification {
    Visibility(bool),
    Items(PopupUpdate),
    Highlighted(usize, String),
    Committed(String),
}

struct ControllerState<H> {
    host: H,
    source: SuggestionSource,
    config: AssistConfig,
    popup: PopupState,
    /// Text written by the last commit, expected to come back as a text change.
    pending_echo: Option<String>,
    /// Bumped on every lookup and every hide; background answers tagged with
    /// an older value are dropped.
    generation: u64,
    pending_focus_check: Option<TaskId>,
}

struct ControllerShared<H> {
    state: RefCell<ControllerState<H>>,
    signals: AssistSignals,
}

/// Autocomplete interaction controller for one text input.
///
/// The controller is single-threaded: it lives on the UI thread together with
/// the [`EventLoop`] it posts deferred work to.
///
/// # Signals
///
/// See [`AssistSignals`], reachable through [`signals`](Self::signals).
pub struct AutocompleteController<H: AssistHost + 'static> {
    shared: Rc<ControllerShared<H>>,
    event_loop: LoopHandle,
    liveness: LivenessFlag,
}

impl<H: AssistHost + 'static> AutocompleteController<H> {
    /// Create a controller with the default configuration.
    pub fn new<P>(host: H, provider: P, event_loop: &EventLoop) -> Self
    where
        P: SuggestionProvider + 'static,
    {
        Self::build(
            host,
            SuggestionSource::Inline(Box::new(provider)),
            AssistConfig::default(),
            event_loop.handle(),
        )
    }

    /// Create a controller with a validated configuration.
    pub fn with_config<P>(
        host: H,
        provider: P,
        config: AssistConfig,
        event_loop: &EventLoop,
    ) -> Result<Self>
    where
        P: SuggestionProvider + 'static,
    {
        config.validate()?;
        Ok(Self::build(
            host,
            SuggestionSource::Inline(Box::new(provider)),
            config,
            event_loop.handle(),
        ))
    }

    /// Create a controller whose provider runs on a background thread.
    ///
    /// Text changes hide the popup and send a request; answers are applied by
    /// [`poll_background`](Self::poll_background) or
    /// [`wait_background`](Self::wait_background).
    pub fn with_background_provider(
        host: H,
        worker: BackgroundProvider,
        config: AssistConfig,
        event_loop: &EventLoop,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(
            host,
            SuggestionSource::Background(worker),
            config,
            event_loop.handle(),
        ))
    }

    fn build(host: H, source: SuggestionSource, config: AssistConfig, event_loop: LoopHandle) -> Self {
        let state = ControllerState {
            host,
            source,
            config,
            popup: PopupState::new(),
            pending_echo: None,
            generation: 0,
            pending_focus_check: None,
        };
        Self {
            shared: Rc::new(ControllerShared {
                state: RefCell::new(state),
                signals: AssistSignals::default(),
            }),
            event_loop,
            liveness: LivenessFlag::new(),
        }
    }

    /// Signals for observers of the popup.
    pub fn signals(&self) -> &AssistSignals {
        &self.shared.signals
    }

    // =========================================================================
    // Event Handlers
    // =========================================================================

    /// Route a message to its handler.
    ///
    /// Returns the key disposition for [`AssistMessage::KeyPressed`] and
    /// [`KeyDisposition::Propagate`] for everything else.
    pub fn dispatch(&self, message: AssistMessage) -> KeyDisposition {
        tracing::trace!(target: targets::CONTROLLER, kind = message.kind(), "dispatch");
        match message {
            AssistMessage::TextChanged(text) => self.on_text_changed(&text),
            AssistMessage::KeyPressed(key) => return self.on_key_pressed(key),
            AssistMessage::FocusLost => self.on_focus_lost(),
            AssistMessage::HostMoved => self.on_host_moved(),
            AssistMessage::ItemCommitted(index) => self.on_item_committed(index),
            AssistMessage::ItemHovered(index) => self.on_item_hovered(index),
        }
        KeyDisposition::Propagate
    }

    /// The input text changed.
    ///
    /// Empty text hides the popup. Otherwise the provider is asked for
    /// candidates; an error or an empty answer hides the popup, anything else
    /// replaces the list (truncated to the configured maximum) and shows it
    /// with no item highlighted.
    pub fn on_text_changed(&self, text: &str) {
        if !self.liveness.is_alive() {
            return;
        }
        self.shared.text_changed(text);
    }

    /// A key was pressed in the input.
    ///
    /// Returns [`KeyDisposition::Suppress`] when the popup consumed the key
    /// and the input must not apply its default handling.
    pub fn on_key_pressed(&self, key: Key) -> KeyDisposition {
        if !self.liveness.is_alive() {
            return KeyDisposition::Propagate;
        }
        self.shared.key_pressed(key)
    }

    /// The input lost focus.
    ///
    /// Posts a check for the next event loop turn. A check that is still
    /// pending is replaced.
    pub fn on_focus_lost(&self) {
        if !self.liveness.is_alive() {
            return;
        }

        let previous = self.shared.state.borrow_mut().pending_focus_check.take();
        if let Some(id) = previous {
            let _ = self.event_loop.cancel_task(id);
        }

        let weak: Weak<ControllerShared<H>> = Rc::downgrade(&self.shared);
        let liveness = self.liveness.clone();
        let posted = self.event_loop.post_task(move || {
            if !liveness.is_alive() {
                tracing::trace!(target: targets::CONTROLLER, "focus check after dispose, skipping");
                return;
            }
            let Some(shared) = weak.upgrade() else {
                return;
            };
            if let Err(err) = shared.focus_check() {
                tracing::debug!(target: targets::CONTROLLER, error = %err, "focus check skipped");
            }
        });

        match posted {
            Ok(id) => self.shared.state.borrow_mut().pending_focus_check = Some(id),
            Err(err) => {
                tracing::warn!(target: targets::CONTROLLER, error = %err, "could not defer focus check");
            }
        }
    }

    /// The window hosting the input moved; the popup is hidden.
    pub fn on_host_moved(&self) {
        self.shared.hide_popup("host moved");
    }

    /// The user accepted `index` in the popup list.
    ///
    /// Invalid requests are logged and ignored. Use
    /// [`try_commit`](Self::try_commit) to see why a commit was refused.
    pub fn on_item_committed(&self, index: usize) {
        if let Err(err) = self.try_commit(index) {
            tracing::debug!(target: targets::CONTROLLER, index, error = %err, "commit ignored");
        }
    }

    /// Commit `index`: write the item into the input and hide the popup.
    ///
    /// Fails without changing anything when the popup is hidden or `index`
    /// is out of range.
    pub fn try_commit(&self, index: usize) -> Result<String> {
        if !self.liveness.is_alive() {
            return Err(AssistError::DisposedHost);
        }
        let mut notes = Vec::new();
        let result = self.shared.state.borrow_mut().commit(index, &mut notes);
        self.shared.announce(notes);
        result
    }

    /// The pointer moved over `index` in the popup list.
    ///
    /// Moves the highlight without committing.
    pub fn on_item_hovered(&self, index: usize) {
        if !self.liveness.is_alive() {
            return;
        }
        let mut notes = Vec::new();
        {
            let mut state = self.shared.state.borrow_mut();
            if state.popup.selected() != Some(index) && state.popup.select(index) {
                state.note_highlight(index, &mut notes);
            }
        }
        self.shared.announce(notes);
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Get the maximum number of items shown.
    pub fn max_visible_items(&self) -> usize {
        self.shared.state.borrow().config.max_visible_items
    }

    /// Set the maximum number of items shown.
    ///
    /// Applies from the next lookup on; a list already shown is not trimmed.
    pub fn set_max_visible_items(&self, count: usize) {
        self.shared.state.borrow_mut().config.max_visible_items = count.max(1);
    }

    pub fn config(&self) -> AssistConfig {
        self.shared.state.borrow().config.clone()
    }

    /// Replace the configuration. Like
    /// [`set_max_visible_items`](Self::set_max_visible_items) it only affects
    /// later lookups.
    pub fn set_config(&self, config: AssistConfig) -> std::result::Result<(), ConfigError> {
        config.validate()?;
        self.shared.state.borrow_mut().config = config;
        Ok(())
    }

    // =========================================================================
    // Provider Access
    // =========================================================================

    /// Swap in a new provider. The popup is hidden since its list came from
    /// the old one.
    pub fn set_provider<P>(&self, provider: P)
    where
        P: SuggestionProvider + 'static,
    {
        self.shared
            .replace_source(SuggestionSource::Inline(Box::new(provider)));
    }

    /// Swap in a background provider. The popup is hidden.
    pub fn set_background_provider(&self, worker: BackgroundProvider) {
        self.shared.replace_source(SuggestionSource::Background(worker));
    }

    /// Run `f` against the inline provider.
    ///
    /// Returns `None` when the provider runs in the background.
    pub fn with_provider_mut<R>(&self, f: impl FnOnce(&mut dyn SuggestionProvider) -> R) -> Option<R> {
        let mut state = self.shared.state.borrow_mut();
        match &mut state.source {
            SuggestionSource::Inline(provider) => Some(f(provider.as_mut())),
            SuggestionSource::Background(_) => None,
        }
    }

    /// Check if suggestions are computed on a background thread.
    pub fn is_background(&self) -> bool {
        matches!(
            self.shared.state.borrow().source,
            SuggestionSource::Background(_)
        )
    }

    /// Look up suggestions again for the host's current text.
    pub fn refresh(&self) {
        if !self.liveness.is_alive() {
            return;
        }
        let text = self.shared.state.borrow().host.text();
        self.shared.text_changed(&text);
    }

    /// Apply every finished background answer.
    ///
    /// Answers for anything but the latest request are dropped. Returns
    /// `true` if a current answer was applied.
    pub fn poll_background(&self) -> bool {
        if !self.liveness.is_alive() {
            return false;
        }
        let mut applied = false;
        loop {
            let response = match &self.shared.state.borrow().source {
                SuggestionSource::Background(worker) => worker.try_recv(),
                SuggestionSource::Inline(_) => None,
            };
            let Some(response) = response else {
                break;
            };
            applied |= self.shared.apply_response(response);
        }
        applied
    }

    /// Block for up to `timeout` until the answer to the latest request
    /// arrives, then apply it.
    ///
    /// Returns `false` on timeout, when there is no background provider, when
    /// the worker is gone, or after [`dispose`](Self::dispose). A timeout too
    /// large to represent as a deadline waits without limit.
    pub fn wait_background(&self, timeout: Duration) -> bool {
        if !self.liveness.is_alive() {
            return false;
        }
        let deadline = Instant::now().checked_add(timeout);
        loop {
            let response = match &self.shared.state.borrow().source {
                SuggestionSource::Background(worker) => match deadline {
                    Some(deadline) => {
                        worker.recv_timeout(deadline.saturating_duration_since(Instant::now()))
                    }
                    None => worker.recv(),
                },
                SuggestionSource::Inline(_) => return false,
            };
            match response {
                Some(response) => {
                    if self.shared.apply_response(response) {
                        return true;
                    }
                }
                None => return false,
            }
        }
    }

    // =========================================================================
    // State Queries
    // =========================================================================

    pub fn is_popup_visible(&self) -> bool {
        self.shared.state.borrow().popup.is_visible()
    }

    /// Items of the visible popup; empty while hidden.
    pub fn items(&self) -> Vec<String> {
        let state = self.shared.state.borrow();
        if state.popup.is_visible() {
            state.popup.items().to_vec()
        } else {
            Vec::new()
        }
    }

    /// Highlighted index, `None` when nothing is highlighted.
    pub fn selected_index(&self) -> Option<usize> {
        self.shared.state.borrow().popup.selected()
    }

    /// Text of the highlighted item.
    pub fn selected_item(&self) -> Option<String> {
        self.shared
            .state
            .borrow()
            .popup
            .selected_item()
            .map(str::to_string)
    }

    /// Placement of the visible popup.
    pub fn placement(&self) -> Option<Placement> {
        let state = self.shared.state.borrow();
        state
            .popup
            .is_visible()
            .then(|| state.popup.placement())
            .flatten()
    }

    pub fn nav_state(&self) -> NavState {
        self.shared.state.borrow().popup.nav_state()
    }

    /// A copy of the full popup state.
    pub fn popup_state(&self) -> PopupState {
        self.shared.state.borrow().popup.clone()
    }

    /// Check if a deferred focus check is waiting for the event loop.
    pub fn has_pending_focus_check(&self) -> bool {
        self.shared.state.borrow().pending_focus_check.is_some()
    }

    /// Run `f` with the host.
    pub fn with_host<R>(&self, f: impl FnOnce(&H) -> R) -> R {
        f(&self.shared.state.borrow().host)
    }

    /// Run `f` with the host, mutably. `f` must not call back into the
    /// controller.
    pub fn with_host_mut<R>(&self, f: impl FnOnce(&mut H) -> R) -> R {
        f(&mut self.shared.state.borrow_mut().host)
    }

    // =========================================================================
    // Teardown
    // =========================================================================

    /// Tear the controller down ahead of drop.
    ///
    /// Hides the popup and cancels the pending focus check. Every later event
    /// is ignored: keys propagate, commits fail with
    /// [`AssistError::DisposedHost`] and background answers are not applied.
    pub fn dispose(&self) {
        if !self.liveness.is_alive() {
            return;
        }
        self.liveness.revoke();
        let pending = self.shared.state.borrow_mut().pending_focus_check.take();
        if let Some(id) = pending {
            let _ = self.event_loop.cancel_task(id);
        }
        self.shared.hide_popup("disposed");
        tracing::debug!(target: targets::CONTROLLER, "controller disposed");
    }

    pub fn is_disposed(&self) -> bool {
        !self.liveness.is_alive()
    }
}

impl<H: AssistHost + 'static> Drop for AutocompleteController<H> {
    fn drop(&mut self) {
        self.liveness.revoke();
    }
}

impl<H: AssistHost + 'static> std::fmt::Debug for AutocompleteController<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state.borrow();
        f.debug_struct("AutocompleteController")
            .field("popup", &state.popup)
            .field("config", &state.config)
            .field("generation", &state.generation)
            .field("disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Shared state
// =============================================================================

impl<H: AssistHost> ControllerShared<H> {
    fn text_changed(&self, text: &str) {
        let mut notes = Vec::new();
        {
            let mut guard = self.state.borrow_mut();
            let state = &mut *guard;

            if let Some(echo) = state.pending_echo.take() {
                if echo == text {
                    tracing::trace!(target: targets::CONTROLLER, "ignoring commit echo");
                    return;
                }
            }

            state.generation += 1;
            if text.is_empty() {
                state.hide(&mut notes);
            } else if let SuggestionSource::Inline(provider) = &mut state.source {
                let result = call_provider(provider.as_mut(), text);
                state.apply_suggestions(text, result, &mut notes);
            } else {
                // The shown list matches older text until the answer arrives.
                state.hide(&mut notes);
                let generation = state.generation;
                let sent = match &state.source {
                    SuggestionSource::Background(worker) => worker.request(generation, text),
                    SuggestionSource::Inline(_) => Ok(()),
                };
                if let Err(err) = sent {
                    state.apply_suggestions(text, Err(err), &mut notes);
                }
            }
        }
        self.announce(notes);
    }

    fn key_pressed(&self, key: Key) -> KeyDisposition {
        let mut notes = Vec::new();
        let disposition = {
            let mut state = self.state.borrow_mut();
            let step = navigation::transition(state.popup.nav_state(), key, state.popup.len());
            match step.action {
                // Escape on a closed popup still cancels a lookup in flight.
                NavAction::None if key == Key::Escape => state.hide(&mut notes),
                NavAction::None => {}
                NavAction::Select(index) => {
                    if state.popup.select(index) {
                        state.note_highlight(index, &mut notes);
                    }
                }
                NavAction::Commit(index) => {
                    if let Err(err) = state.commit(index, &mut notes) {
                        tracing::debug!(target: targets::CONTROLLER, index, error = %err, "commit ignored");
                    }
                }
                NavAction::Dismiss => state.hide(&mut notes),
            }
            step.disposition
        };
        self.announce(notes);
        disposition
    }

    fn focus_check(&self) -> Result<()> {
        let mut notes = Vec::new();
        {
            let mut state = self.state.borrow_mut();
            state.pending_focus_check = None;
            if state.host.is_disposed() {
                return Err(AssistError::DisposedHost);
            }
            let owner = state.host.focus_owner();
            if owner.is_within_widget() {
                tracing::trace!(target: targets::CONTROLLER, ?owner, "focus stayed inside widget");
                return Ok(());
            }
            tracing::debug!(target: targets::CONTROLLER, ?owner, "focus left widget");
            state.hide(&mut notes);
        }
        self.announce(notes);
        Ok(())
    }

    fn apply_response(&self, response: SuggestionResponse) -> bool {
        let mut notes = Vec::new();
        let current = {
            let mut state = self.state.borrow_mut();
            if response.generation != state.generation {
                tracing::trace!(
                    target: targets::CONTROLLER,
                    stale = response.generation,
                    current = state.generation,
                    "dropping stale suggestions"
                );
                false
            } else {
                state.apply_suggestions(&response.text, response.result, &mut notes);
                true
            }
        };
        self.announce(notes);
        current
    }

    fn hide_popup(&self, reason: &'static str) {
        let mut notes = Vec::new();
        {
            let mut state = self.state.borrow_mut();
            if state.popup.is_visible() {
                tracing::debug!(target: targets::CONTROLLER, reason, "hiding popup");
            }
            state.hide(&mut notes);
        }
        self.announce(notes);
    }

    fn replace_source(&self, source: SuggestionSource) {
        let old = {
            let mut state = self.state.borrow_mut();
            std::mem::replace(&mut state.source, source)
        };
        // Drop the old source outside the borrow.
        drop(old);
        self.hide_popup("provider replaced");
    }

    fn announce(&self, notes: Vec<Notification>) {
        for note in notes {
            match note {
                Notification::Visibility(visible) => self.signals.visibility_changed.emit(visible),
                Notification::Items(update) => self.signals.items_changed.emit(update),
                Notification::Highlighted(index, item) => self.signals.highlighted.emit((index, item)),
                Notification::Committed(text) => self.signals.committed.emit(text),
            }
        }
    }
}

impl<H: AssistHost> ControllerState<H> {
    fn apply_suggestions(
        &mut self,
        text: &str,
        result: std::result::Result<Vec<String>, ProviderError>,
        notes: &mut Vec<Notification>,
    ) {
        let mut items = match result {
            Ok(items) => items,
            Err(err) => {
                tracing::warn!(target: targets::CONTROLLER, text, error = %err, "provider failed, hiding popup");
                self.hide(notes);
                return;
            }
        };
        if items.is_empty() {
            self.hide(notes);
            return;
        }
        items.truncate(self.config.max_visible_items);

        let anchor = self.host.anchor_geometry();
        let size = self.host.measure_popup(&items, &anchor, &self.config.metrics);
        let placement = place(
            anchor.anchor_point(self.config.popup_overlap),
            size,
            anchor.screen,
            anchor.parent,
        );

        let was_visible = self.popup.is_visible();
        self.popup.show(items.clone(), placement);
        tracing::trace!(target: targets::CONTROLLER, text, count = items.len(), "showing suggestions");

        notes.push(Notification::Items(PopupUpdate { items, placement }));
        if !was_visible {
            notes.push(Notification::Visibility(true));
        }
    }

    fn commit(&mut self, index: usize, notes: &mut Vec<Notification>) -> Result<String> {
        if !self.popup.is_visible() {
            return Err(AssistError::PopupHidden);
        }
        let Some(item) = self.popup.item(index).map(str::to_string) else {
            return Err(AssistError::InvalidCommitIndex {
                index,
                len: self.popup.len(),
            });
        };

        self.hide(notes);
        self.pending_echo = Some(item.clone());
        self.host.set_text(&item);
        tracing::debug!(target: targets::CONTROLLER, index, item = %item, "committed suggestion");
        notes.push(Notification::Committed(item.clone()));
        Ok(item)
    }

    fn hide(&mut self, notes: &mut Vec<Notification>) {
        // Answers still in flight belong to a list nobody wants any more.
        self.generation += 1;
        if self.popup.hide() {
            notes.push(Notification::Visibility(false));
        }
    }

    fn note_highlight(&self, index: usize, notes: &mut Vec<Notification>) {
        if let Some(item) = self.popup.item(index) {
            notes.push(Notification::Highlighted(index, item.to_string()));
        }
    }
}
