//! Tests for the autocomplete controller driven through its public API.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use typeahead::prelude::*;

/// A text field whose focus and teardown state the test controls from outside.
struct FakeField {
    text: Rc<RefCell<String>>,
    focus: Rc<Cell<FocusOwner>>,
    disposed: Rc<Cell<bool>>,
    input: Rect,
    screen: Rect,
    parent: Rect,
}

#[derive(Clone)]
struct FieldHandles {
    text: Rc<RefCell<String>>,
    focus: Rc<Cell<FocusOwner>>,
    disposed: Rc<Cell<bool>>,
}

fn field() -> (FakeField, FieldHandles) {
    let handles = FieldHandles {
        text: Rc::new(RefCell::new(String::new())),
        focus: Rc::new(Cell::new(FocusOwner::Input)),
        disposed: Rc::new(Cell::new(false)),
    };
    let field = FakeField {
        text: handles.text.clone(),
        focus: handles.focus.clone(),
        disposed: handles.disposed.clone(),
        input: Rect::new(200.0, 300.0, 240.0, 24.0),
        screen: Rect::new(0.0, 0.0, 1280.0, 800.0),
        parent: Rect::new(180.0, 280.0, 400.0, 200.0),
    };
    (field, handles)
}

impl AssistHost for FakeField {
    fn text(&self) -> String {
        self.text.borrow().clone()
    }

    fn set_text(&mut self, text: &str) {
        *self.text.borrow_mut() = text.to_string();
    }

    fn anchor_geometry(&self) -> AnchorGeometry {
        AnchorGeometry {
            input: self.input,
            border_width: 1.0,
            screen: self.screen,
            parent: self.parent,
        }
    }

    fn focus_owner(&self) -> FocusOwner {
        self.focus.get()
    }

    fn is_disposed(&self) -> bool {
        self.disposed.get()
    }
}

fn fruit_provider() -> impl SuggestionProvider + 'static {
    |text: &str| -> Result<Vec<String>, ProviderError> {
        if text == "ap" {
            Ok(vec!["apple".into(), "apricot".into(), "apply".into()])
        } else {
            Ok(Vec::new())
        }
    }
}

fn numbered_provider(count: usize) -> impl SuggestionProvider + 'static {
    move |text: &str| -> Result<Vec<String>, ProviderError> {
        Ok((0..count).map(|i| format!("{text}{i}")).collect())
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("typeahead=trace")
        .with_test_writer()
        .try_init();
}

fn type_text<H: AssistHost + 'static>(controller: &AutocompleteController<H>, handles: &FieldHandles, text: &str) {
    *handles.text.borrow_mut() = text.to_string();
    controller.on_text_changed(text);
}

// ============================================================================
// Text changes
// ============================================================================

#[test]
fn test_shows_all_candidates_in_order() {
    let event_loop = EventLoop::new();
    let (field, handles) = field();
    let controller = AutocompleteController::new(field, fruit_provider(), &event_loop);

    type_text(&controller, &handles, "ap");

    assert!(controller.is_popup_visible());
    assert_eq!(controller.items(), vec!["apple", "apricot", "apply"]);
    assert_eq!(controller.selected_index(), None);
    assert_eq!(controller.nav_state(), NavState::OpenNoSelection);
}

#[test]
fn test_shown_count_is_min_of_limit_and_results() {
    for limit in [1usize, 3, 10] {
        for results in [1usize, 3, 10, 25] {
            let event_loop = EventLoop::new();
            let (field, handles) = field();
            let controller = AutocompleteController::new(field, numbered_provider(results), &event_loop);
            controller.set_max_visible_items(limit);

            type_text(&controller, &handles, "x");
            assert_eq!(controller.items().len(), limit.min(results), "limit {limit}, results {results}");
            assert_eq!(controller.items()[0], "x0");
        }
    }
}

#[test]
fn test_with_config_applies_limit() {
    init_tracing();
    let event_loop = EventLoop::new();
    let (spare, _) = field();
    let invalid = AssistConfig::default().with_max_visible_items(0);
    assert!(AutocompleteController::with_config(spare, numbered_provider(5), invalid, &event_loop).is_err());

    let (field, handles) = field();
    let config = AssistConfig::default().with_max_visible_items(2);
    let controller =
        AutocompleteController::with_config(field, numbered_provider(5), config, &event_loop).unwrap();

    type_text(&controller, &handles, "n");
    assert_eq!(controller.items(), vec!["n0", "n1"]);
}

#[test]
fn test_empty_text_hides_popup() {
    let event_loop = EventLoop::new();
    let (field, handles) = field();
    let controller = AutocompleteController::new(field, fruit_provider(), &event_loop);

    type_text(&controller, &handles, "ap");
    controller.on_key_pressed(Key::ArrowDown);
    type_text(&controller, &handles, "");

    assert!(!controller.is_popup_visible());
    assert_eq!(controller.selected_index(), None);
    assert!(controller.items().is_empty());
}

#[test]
fn test_empty_result_hides_popup() {
    let event_loop = EventLoop::new();
    let (field, handles) = field();
    let controller = AutocompleteController::new(field, fruit_provider(), &event_loop);

    type_text(&controller, &handles, "ap");
    type_text(&controller, &handles, "apz");
    assert!(!controller.is_popup_visible());
}

#[test]
fn test_provider_error_hides_popup() {
    let event_loop = EventLoop::new();
    let (field, handles) = field();
    let calls = Rc::new(Cell::new(0));
    let counter = calls.clone();
    let provider = move |text: &str| -> Result<Vec<String>, ProviderError> {
        counter.set(counter.get() + 1);
        if text.len() > 2 {
            Err(ProviderError::failed("index offline"))
        } else {
            Ok(vec![format!("{text}-one")])
        }
    };
    init_tracing();
    let controller = AutocompleteController::new(field, provider, &event_loop);

    type_text(&controller, &handles, "ab");
    assert!(controller.is_popup_visible());
    type_text(&controller, &handles, "abc");
    assert!(!controller.is_popup_visible());
    assert_eq!(*handles.text.borrow(), "abc");
    assert_eq!(calls.get(), 2);
}

#[test]
fn test_new_text_resets_selection() {
    let event_loop = EventLoop::new();
    let (field, handles) = field();
    let controller = AutocompleteController::new(field, numbered_provider(4), &event_loop);

    type_text(&controller, &handles, "a");
    controller.on_key_pressed(Key::ArrowDown);
    assert_eq!(controller.selected_index(), Some(0));

    type_text(&controller, &handles, "ab");
    assert_eq!(controller.selected_index(), None);
    assert_eq!(controller.items()[0], "ab0");
}

// ============================================================================
// Keyboard navigation
// ============================================================================

#[test]
fn test_arrow_down_twice_then_enter_commits() {
    let event_loop = EventLoop::new();
    let (field, handles) = field();
    let controller = AutocompleteController::new(field, fruit_provider(), &event_loop);

    type_text(&controller, &handles, "ap");
    assert_eq!(controller.on_key_pressed(Key::ArrowDown), KeyDisposition::Suppress);
    assert_eq!(controller.on_key_pressed(Key::ArrowDown), KeyDisposition::Suppress);
    assert_eq!(controller.selected_index(), Some(1));
    assert_eq!(controller.selected_item().as_deref(), Some("apricot"));

    controller.on_key_pressed(Key::Enter);
    assert_eq!(*handles.text.borrow(), "apricot");
    assert!(!controller.is_popup_visible());
}

#[test]
fn test_wraps_in_both_directions() {
    let event_loop = EventLoop::new();
    let (field, handles) = field();
    let controller = AutocompleteController::new(field, fruit_provider(), &event_loop);

    type_text(&controller, &handles, "ap");
    controller.on_key_pressed(Key::ArrowUp);
    assert_eq!(controller.selected_index(), Some(2));
    controller.on_key_pressed(Key::ArrowDown);
    assert_eq!(controller.selected_index(), Some(0));
    controller.on_key_pressed(Key::ArrowUp);
    assert_eq!(controller.selected_index(), Some(2));
}

#[test]
fn test_enter_without_selection_keeps_popup() {
    let event_loop = EventLoop::new();
    let (field, handles) = field();
    let controller = AutocompleteController::new(field, fruit_provider(), &event_loop);

    type_text(&controller, &handles, "ap");
    assert_eq!(controller.on_key_pressed(Key::Enter), KeyDisposition::Propagate);
    assert!(controller.is_popup_visible());
    assert_eq!(*handles.text.borrow(), "ap");
}

#[test]
fn test_escape_hides_without_touching_text() {
    let event_loop = EventLoop::new();
    let (field, handles) = field();
    let controller = AutocompleteController::new(field, fruit_provider(), &event_loop);

    type_text(&controller, &handles, "ap");
    controller.on_key_pressed(Key::ArrowDown);
    controller.on_key_pressed(Key::Escape);

    assert!(!controller.is_popup_visible());
    assert_eq!(*handles.text.borrow(), "ap");
}

#[test]
fn test_keys_pass_through_while_closed() {
    let event_loop = EventLoop::new();
    let (field, _handles) = field();
    let controller = AutocompleteController::new(field, fruit_provider(), &event_loop);

    for key in [Key::ArrowDown, Key::ArrowUp, Key::Enter, Key::Escape] {
        assert_eq!(controller.on_key_pressed(key), KeyDisposition::Propagate);
    }
    assert_eq!(controller.nav_state(), NavState::Closed);
}

// ============================================================================
// Commit
// ============================================================================

#[test]
fn test_item_committed_by_pointer() {
    let event_loop = EventLoop::new();
    let (field, handles) = field();
    let controller = AutocompleteController::new(field, fruit_provider(), &event_loop);
    let committed = Arc::new(Mutex::new(Vec::new()));
    let sink = committed.clone();
    controller.signals().committed.connect(move |text| sink.lock().push(text.clone()));

    type_text(&controller, &handles, "ap");
    controller.on_item_hovered(2);
    controller.on_item_committed(2);

    assert_eq!(*handles.text.borrow(), "apply");
    assert!(!controller.is_popup_visible());
    assert_eq!(*committed.lock(), vec!["apply".to_string()]);
}

#[test]
fn test_invalid_commit_is_ignored() {
    let event_loop = EventLoop::new();
    let (field, handles) = field();
    let controller = AutocompleteController::new(field, fruit_provider(), &event_loop);

    controller.on_item_committed(0);
    assert_eq!(*handles.text.borrow(), "");

    type_text(&controller, &handles, "ap");
    controller.on_key_pressed(Key::ArrowDown);
    controller.on_item_committed(3);

    assert!(controller.is_popup_visible());
    assert_eq!(controller.selected_index(), Some(0));
    assert_eq!(*handles.text.borrow(), "ap");
}

// ============================================================================
// Dismissal
// ============================================================================

#[test]
fn test_host_moved_hides_popup() {
    let event_loop = EventLoop::new();
    let (field, handles) = field();
    let controller = AutocompleteController::new(field, fruit_provider(), &event_loop);

    type_text(&controller, &handles, "ap");
    controller.dispatch(AssistMessage::HostMoved);
    assert!(!controller.is_popup_visible());

    // Harmless while already hidden.
    controller.on_host_moved();
    assert!(!controller.is_popup_visible());
}

#[test]
fn test_focus_check_runs_on_next_turn() {
    let event_loop = EventLoop::new();
    let (field, handles) = field();
    let controller = AutocompleteController::new(field, fruit_provider(), &event_loop);

    type_text(&controller, &handles, "ap");
    handles.focus.set(FocusOwner::Elsewhere);
    controller.on_focus_lost();

    assert!(controller.is_popup_visible());
    assert!(controller.has_pending_focus_check());

    assert_eq!(event_loop.run_turn(), 1);
    assert!(!controller.is_popup_visible());
}

#[test]
fn test_focus_moving_into_list_keeps_popup() {
    let event_loop = EventLoop::new();
    let (field, handles) = field();
    let controller = AutocompleteController::new(field, fruit_provider(), &event_loop);

    type_text(&controller, &handles, "ap");

    // The toolkit reports focus loss before it assigns the new owner.
    handles.focus.set(FocusOwner::Nothing);
    controller.on_focus_lost();
    handles.focus.set(FocusOwner::SuggestionList);

    event_loop.run_until_idle(4).unwrap();
    assert!(controller.is_popup_visible());
}

#[test]
fn test_focus_check_noop_after_host_teardown() {
    let event_loop = EventLoop::new();
    let (field, handles) = field();
    let controller = AutocompleteController::new(field, fruit_provider(), &event_loop);

    type_text(&controller, &handles, "ap");
    handles.focus.set(FocusOwner::Elsewhere);
    controller.on_focus_lost();
    handles.disposed.set(true);

    event_loop.run_turn();
    assert!(controller.is_popup_visible());
    assert!(!controller.has_pending_focus_check());
}

#[test]
fn test_focus_check_noop_after_controller_dropped() {
    let event_loop = EventLoop::new();
    let (field, handles) = field();
    let controller = AutocompleteController::new(field, fruit_provider(), &event_loop);

    type_text(&controller, &handles, "ap");
    handles.focus.set(FocusOwner::Elsewhere);
    controller.on_focus_lost();
    drop(controller);

    assert_eq!(event_loop.run_turn(), 1);
    assert!(!event_loop.has_pending());
}

#[test]
fn test_focus_lost_after_event_loop_gone() {
    let event_loop = EventLoop::new();
    let (field, handles) = field();
    let controller = AutocompleteController::new(field, fruit_provider(), &event_loop);
    drop(event_loop);

    type_text(&controller, &handles, "ap");
    controller.on_focus_lost();
    assert!(!controller.has_pending_focus_check());
    assert!(controller.is_popup_visible());
}

// ============================================================================
// Placement
// ============================================================================

#[test]
fn test_popup_placed_below_input() {
    let event_loop = EventLoop::new();
    let (field, handles) = field();
    let controller = AutocompleteController::new(field, fruit_provider(), &event_loop);

    type_text(&controller, &handles, "ap");
    let placement = controller.placement().unwrap();

    // input bottom 324, border 1, overlap 3
    assert_eq!(placement.origin, Point::new(200.0, 322.0));
    assert_eq!(placement.size, Size::new(240.0, 74.0));
    assert!(!placement.flipped_above);
}

#[test]
fn test_popup_flips_above_near_screen_bottom() {
    let event_loop = EventLoop::new();
    let (mut field, handles) = field();
    field.input = Rect::new(200.0, 760.0, 240.0, 24.0);
    field.parent = Rect::new(180.0, 700.0, 400.0, 100.0);
    let controller = AutocompleteController::new(field, fruit_provider(), &event_loop);

    type_text(&controller, &handles, "ap");
    let placement = controller.placement().unwrap();

    assert!(placement.flipped_above);
    assert_eq!(placement.origin.y, 700.0 - 74.0);
}

#[test]
fn test_signal_reports_items_and_placement() {
    let event_loop = EventLoop::new();
    let (field, handles) = field();
    let controller = AutocompleteController::new(field, fruit_provider(), &event_loop);
    let updates = Arc::new(Mutex::new(Vec::new()));
    let sink = updates.clone();
    controller
        .signals()
        .items_changed
        .connect(move |update| sink.lock().push(update.clone()));

    type_text(&controller, &handles, "ap");

    let updates = updates.lock();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].items.len(), 3);
    assert_eq!(Some(updates[0].placement), controller.placement());
}

// ============================================================================
// Background provider
// ============================================================================

#[test]
fn test_background_results_applied() {
    let event_loop = EventLoop::new();
    let (field, handles) = field();
    let worker =
        BackgroundProvider::spawn(StringListProvider::from(vec!["apple", "apricot", "banana"])).unwrap();
    let controller = AutocompleteController::with_background_provider(
        field,
        worker,
        AssistConfig::default(),
        &event_loop,
    )
    .unwrap();
    assert!(controller.is_background());

    type_text(&controller, &handles, "ap");
    assert!(controller.wait_background(Duration::from_secs(5)));
    assert_eq!(controller.items(), vec!["apple", "apricot"]);
}

#[test]
fn test_stale_background_results_discarded() {
    let event_loop = EventLoop::new();
    let (field, handles) = field();
    let (release_tx, release_rx) = crossbeam_channel::bounded::<()>(1);
    let provider = move |text: &str| -> Result<Vec<String>, ProviderError> {
        if text == "a" {
            let _ = release_rx.recv();
        }
        Ok(vec![format!("{text}-result")])
    };
    let worker = BackgroundProvider::spawn(provider).unwrap();
    let controller = AutocompleteController::with_background_provider(
        field,
        worker,
        AssistConfig::default(),
        &event_loop,
    )
    .unwrap();

    type_text(&controller, &handles, "a");
    type_text(&controller, &handles, "ab");
    release_tx.send(()).unwrap();

    assert!(controller.wait_background(Duration::from_secs(5)));
    assert_eq!(controller.items(), vec!["ab-result"]);

    // Nothing older may replace the current list afterwards.
    std::thread::sleep(Duration::from_millis(20));
    controller.poll_background();
    assert_eq!(controller.items(), vec!["ab-result"]);
}

#[test]
fn test_background_result_after_escape_is_dropped() {
    let event_loop = EventLoop::new();
    let (field, handles) = field();
    let worker = BackgroundProvider::spawn(StringListProvider::from(vec!["apple", "apply"])).unwrap();
    let controller = AutocompleteController::with_background_provider(
        field,
        worker,
        AssistConfig::default(),
        &event_loop,
    )
    .unwrap();

    type_text(&controller, &handles, "ap");
    assert!(controller.wait_background(Duration::from_secs(5)));
    assert!(controller.is_popup_visible());

    type_text(&controller, &handles, "appl");
    controller.on_key_pressed(Key::Escape);
    assert!(!controller.is_popup_visible());

    assert!(!controller.wait_background(Duration::from_millis(200)));
    assert!(!controller.is_popup_visible());
}

#[test]
fn test_background_list_hidden_while_lookup_pending() {
    init_tracing();
    let event_loop = EventLoop::new();
    let (field, handles) = field();
    let (gate_tx, gate_rx) = crossbeam_channel::bounded::<()>(1);
    let provider = move |text: &str| -> Result<Vec<String>, ProviderError> {
        if text == "apz" {
            let _ = gate_rx.recv_timeout(Duration::from_secs(5));
        }
        Ok(["apple", "apricot"]
            .iter()
            .filter(|item| item.starts_with(text))
            .map(|item| item.to_string())
            .collect())
    };
    let worker = BackgroundProvider::spawn(provider).unwrap();
    let controller = AutocompleteController::with_background_provider(
        field,
        worker,
        AssistConfig::default(),
        &event_loop,
    )
    .unwrap();

    type_text(&controller, &handles, "ap");
    assert!(controller.wait_background(Duration::from_secs(5)));
    assert_eq!(controller.items(), vec!["apple", "apricot"]);

    // The "ap" list must not be committable once the text moved on.
    type_text(&controller, &handles, "apz");
    assert!(!controller.is_popup_visible());
    assert_eq!(controller.on_key_pressed(Key::ArrowDown), KeyDisposition::Propagate);
    controller.on_key_pressed(Key::Enter);
    assert_eq!(*handles.text.borrow(), "apz");

    gate_tx.send(()).unwrap();
    assert!(controller.wait_background(Duration::from_secs(5)));
    assert!(!controller.is_popup_visible());
    assert_eq!(*handles.text.borrow(), "apz");
}

#[test]
fn test_replacing_busy_background_provider_does_not_block() {
    let event_loop = EventLoop::new();
    let (field, handles) = field();
    let (started_tx, started_rx) = crossbeam_channel::bounded::<()>(1);
    let (_gate_tx, gate_rx) = crossbeam_channel::bounded::<()>(1);
    let provider = move |text: &str| -> Result<Vec<String>, ProviderError> {
        let _ = started_tx.try_send(());
        let _ = gate_rx.recv_timeout(Duration::from_secs(2));
        Ok(vec![text.to_string()])
    };
    let worker = BackgroundProvider::spawn(provider).unwrap();
    let controller = AutocompleteController::with_background_provider(
        field,
        worker,
        AssistConfig::default(),
        &event_loop,
    )
    .unwrap();

    type_text(&controller, &handles, "ap");
    started_rx.recv_timeout(Duration::from_secs(5)).unwrap();

    let start = Instant::now();
    controller.set_provider(fruit_provider());
    assert!(start.elapsed() < Duration::from_secs(1));
    assert!(!controller.is_background());

    controller.refresh();
    assert_eq!(controller.items(), vec!["apple", "apricot", "apply"]);
}

#[test]
fn test_wait_background_accepts_unbounded_timeout() {
    let event_loop = EventLoop::new();
    let (field, handles) = field();
    let worker = BackgroundProvider::spawn(StringListProvider::from(vec!["apple", "apricot"])).unwrap();
    let controller = AutocompleteController::with_background_provider(
        field,
        worker,
        AssistConfig::default(),
        &event_loop,
    )
    .unwrap();

    type_text(&controller, &handles, "ap");
    assert!(controller.wait_background(Duration::MAX));
    assert_eq!(controller.items(), vec!["apple", "apricot"]);
}
