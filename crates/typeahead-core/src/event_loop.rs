//! Single-threaded, cooperative event loop.
//!
//! The [`EventLoop`] owns a queue of deferred tasks. Every call to
//! [`EventLoop::run_turn`] executes the tasks that were already queued when
//! the turn began; anything posted while the turn is running waits for the
//! next turn. This gives "run after the current event has been fully
//! processed" semantics, which UI code relies on when it needs to observe
//! state that only settles once the current event returns (for example,
//! which control received focus after a focus-out).
//!
//! # Example
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use typeahead_core::EventLoop;
//!
//! let event_loop = EventLoop::new();
//! let ran = Rc::new(Cell::new(false));
//!
//! let flag = ran.clone();
//! event_loop.post_task(move || flag.set(true));
//! assert!(!ran.get());
//!
//! event_loop.run_turn();
//! assert!(ran.get());
//! ```

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::error::{CoreError, Result};
use crate::logging::targets;
use crate::task::{TaskId, TaskQueue};

struct LoopShared {
    queue: RefCell<TaskQueue>,
    turn: Cell<u64>,
}

/// A single-threaded event loop that runs deferred tasks turn by turn.
///
/// The loop is deliberately `!Send`: tasks may capture `Rc` state owned by
/// the UI thread.
pub struct EventLoop {
    shared: Rc<LoopShared>,
}

impl EventLoop {
    /// Create a new event loop with an empty queue.
    pub fn new() -> Self {
        Self {
            shared: Rc::new(LoopShared {
                queue: RefCell::new(TaskQueue::new()),
                turn: Cell::new(0),
            }),
        }
    }

    /// Get a cheap, clonable handle for posting tasks.
    ///
    /// Handles do not keep the loop alive; posting through a handle whose
    /// loop has been dropped returns [`CoreError::EventLoopGone`].
    pub fn handle(&self) -> LoopHandle {
        LoopHandle {
            shared: Rc::downgrade(&self.shared),
        }
    }

    /// Post a task to run on the next turn.
    pub fn post_task<F>(&self, task: F) -> TaskId
    where
        F: FnOnce() + 'static,
    {
        let id = self.shared.queue.borrow_mut().post(task);
        tracing::trace!(target: targets::EVENT_LOOP, task_id = id.as_u64(), "posted task");
        id
    }

    /// Cancel a task that has not run yet.
    pub fn cancel_task(&self, id: TaskId) -> Result<()> {
        if self.shared.queue.borrow_mut().cancel(id) {
            Ok(())
        } else {
            Err(CoreError::InvalidTaskId)
        }
    }

    /// Number of tasks waiting to run.
    pub fn pending_count(&self) -> usize {
        self.shared.queue.borrow().pending_count()
    }

    /// Check whether any task is waiting to run.
    pub fn has_pending(&self) -> bool {
        self.shared.queue.borrow().has_pending()
    }

    /// Number of turns completed so far.
    pub fn turn(&self) -> u64 {
        self.shared.turn.get()
    }

    /// Run one turn of the loop.
    ///
    /// Only tasks that were queued before this call are executed. Returns the
    /// number of tasks that ran.
    pub fn run_turn(&self) -> usize {
        let boundary = self.shared.queue.borrow().last_id();
        let turn = self.shared.turn.get() + 1;
        self.shared.turn.set(turn);

        let Some(boundary) = boundary else {
            return 0;
        };

        let _span = tracing::trace_span!(target: targets::EVENT_LOOP, "turn", turn).entered();
        let mut executed = 0;
        loop {
            // The borrow must end before the task runs: tasks post more tasks.
            let next = self.shared.queue.borrow_mut().pop_up_to(boundary);
            let Some(task) = next else {
                break;
            };
            task.run();
            executed += 1;
        }
        tracing::trace!(target: targets::EVENT_LOOP, turn, executed, "turn complete");
        executed
    }

    /// Run turns until the queue is empty.
    ///
    /// Fails with [`CoreError::Starved`] if tasks are still pending after
    /// `max_turns` turns, which usually means a task keeps re-posting itself.
    pub fn run_until_idle(&self, max_turns: usize) -> Result<usize> {
        let mut executed = 0;
        for _ in 0..max_turns {
            if !self.has_pending() {
                return Ok(executed);
            }
            executed += self.run_turn();
        }
        if self.has_pending() {
            return Err(CoreError::Starved {
                turns: max_turns,
                pending: self.pending_count(),
            });
        }
        Ok(executed)
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLoop")
            .field("turn", &self.shared.turn.get())
            .field("pending", &self.pending_count())
            .finish()
    }
}

/// A weak, clonable handle to an [`EventLoop`].
#[derive(Clone)]
pub struct LoopHandle {
    shared: Weak<LoopShared>,
}

impl LoopHandle {
    /// Post a task to run on the next turn of the loop.
    pub fn post_task<F>(&self, task: F) -> Result<TaskId>
    where
        F: FnOnce() + 'static,
    {
        let shared = self.shared.upgrade().ok_or(CoreError::EventLoopGone)?;
        let id = shared.queue.borrow_mut().post(task);
        tracing::trace!(target: targets::EVENT_LOOP, task_id = id.as_u64(), "posted task via handle");
        Ok(id)
    }

    /// Cancel a task that has not run yet.
    pub fn cancel_task(&self, id: TaskId) -> Result<()> {
        let shared = self.shared.upgrade().ok_or(CoreError::EventLoopGone)?;
        if shared.queue.borrow_mut().cancel(id) {
            Ok(())
        } else {
            Err(CoreError::InvalidTaskId)
        }
    }

    /// Check whether the loop behind this handle still exists.
    pub fn is_alive(&self) -> bool {
        self.shared.strong_count() > 0
    }
}

impl std::fmt::Debug for LoopHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopHandle")
            .field("alive", &self.is_alive())
            .finish()
    }
}

/// A shared flag that deferred tasks check before touching their owner.
///
/// The owner keeps one copy and calls [`LivenessFlag::revoke`] on teardown;
/// tasks hold clones and bail out once [`LivenessFlag::is_alive`] is false.
#[derive(Debug, Clone)]
pub struct LivenessFlag {
    alive: Rc<Cell<bool>>,
}

impl LivenessFlag {
    /// Create a flag in the alive state.
    pub fn new() -> Self {
        Self {
            alive: Rc::new(Cell::new(true)),
        }
    }

    /// Check whether the owner is still alive.
    pub fn is_alive(&self) -> bool {
        self.alive.get()
    }

    /// Mark the owner as torn down. All clones observe the change.
    pub fn revoke(&self) {
        self.alive.set(false);
    }
}

impl Default for LivenessFlag {
    fn default() -> Self {
        Self::new()
    }
}

static_assertions::assert_not_impl_any!(EventLoop: Send, Sync);
static_assertions::assert_not_impl_any!(LoopHandle: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tasks_posted_during_turn_run_next_turn() {
        let event_loop = EventLoop::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let handle = event_loop.handle();
        let l = log.clone();
        event_loop.post_task(move || {
            l.borrow_mut().push("outer");
            let inner = l.clone();
            handle
                .post_task(move || inner.borrow_mut().push("inner"))
                .unwrap();
        });

        assert_eq!(event_loop.run_turn(), 1);
        assert_eq!(*log.borrow(), vec!["outer"]);

        assert_eq!(event_loop.run_turn(), 1);
        assert_eq!(*log.borrow(), vec!["outer", "inner"]);
        assert_eq!(event_loop.turn(), 2);
    }

    #[test]
    fn test_cancel_task() {
        let event_loop = EventLoop::new();
        let ran = Rc::new(Cell::new(false));
        let flag = ran.clone();
        let id = event_loop.post_task(move || flag.set(true));

        event_loop.cancel_task(id).unwrap();
        assert_eq!(event_loop.cancel_task(id), Err(CoreError::InvalidTaskId));
        assert_eq!(event_loop.run_turn(), 0);
        assert!(!ran.get());
    }

    #[test]
    fn test_handle_outlives_loop() {
        let event_loop = EventLoop::new();
        let handle = event_loop.handle();
        assert!(handle.is_alive());

        drop(event_loop);
        assert!(!handle.is_alive());
        assert_eq!(handle.post_task(|| {}), Err(CoreError::EventLoopGone));
    }

    #[test]
    fn test_run_until_idle_detects_starvation() {
        fn repost(handle: LoopHandle) {
            let next = handle.clone();
            let _ = handle.post_task(move || repost(next));
        }

        let event_loop = EventLoop::new();
        repost(event_loop.handle());

        let err = event_loop.run_until_idle(5).unwrap_err();
        assert_eq!(err, CoreError::Starved { turns: 5, pending: 1 });
    }

    #[test]
    fn test_liveness_flag_shared_between_clones() {
        let flag = LivenessFlag::new();
        let task_copy = flag.clone();
        assert!(task_copy.is_alive());

        flag.revoke();
        assert!(!task_copy.is_alive());
    }
}
