//! Deferred task queue.
//!
//! Tasks are closures posted to run on a later turn of the [`EventLoop`](crate::EventLoop).
//! The queue is single-threaded: tasks may capture `Rc`/`RefCell` state owned by
//! the UI thread.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

/// A unique identifier for a deferred task.
///
/// IDs increase monotonically, so comparing two IDs tells which task was
/// posted first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

impl TaskId {
    /// Get the raw u64 value of this task ID.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Global counter for generating unique task IDs.
static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

fn next_task_id() -> TaskId {
    TaskId(NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed))
}

/// A boxed task closure.
type BoxedTask = Box<dyn FnOnce() + 'static>;

/// A queued task together with its ID.
pub(crate) struct TaskData {
    pub(crate) id: TaskId,
    task: BoxedTask,
}

impl TaskData {
    /// Run the task, consuming it.
    pub(crate) fn run(self) {
        (self.task)();
    }
}

/// FIFO queue of deferred tasks.
#[derive(Default)]
pub struct TaskQueue {
    tasks: VecDeque<TaskData>,
}

impl TaskQueue {
    /// Create an empty task queue.
    pub fn new() -> Self {
        Self {
            tasks: VecDeque::new(),
        }
    }

    /// Post a task to the back of the queue.
    ///
    /// Returns the task ID that can be used to cancel the task.
    pub fn post<F>(&mut self, task: F) -> TaskId
    where
        F: FnOnce() + 'static,
    {
        let id = next_task_id();
        self.tasks.push_back(TaskData {
            id,
            task: Box::new(task),
        });
        id
    }

    /// Cancel a pending task.
    ///
    /// Returns `true` if the task was found and cancelled.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        if let Some(pos) = self.tasks.iter().position(|t| t.id == id) {
            self.tasks.remove(pos);
            true
        } else {
            false
        }
    }

    /// Check if there are any pending tasks.
    pub fn has_pending(&self) -> bool {
        !self.tasks.is_empty()
    }

    /// Get the number of pending tasks.
    pub fn pending_count(&self) -> usize {
        self.tasks.len()
    }

    /// ID of the most recently posted task still in the queue.
    pub(crate) fn last_id(&self) -> Option<TaskId> {
        self.tasks.back().map(|t| t.id)
    }

    /// Pop the front task if it was posted no later than `boundary`.
    pub(crate) fn pop_up_to(&mut self, boundary: TaskId) -> Option<TaskData> {
        match self.tasks.front() {
            Some(front) if front.id <= boundary => self.tasks.pop_front(),
            _ => None,
        }
    }
}

impl std::fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskQueue")
            .field("pending", &self.tasks.len())
            .finish()
    }
}
