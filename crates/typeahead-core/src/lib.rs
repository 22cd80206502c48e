//! Core systems for Typeahead.
//!
//! This crate provides the foundational pieces the autocomplete controller is
//! built on:
//!
//! - **Event Loop**: a single-threaded, cooperative loop with a deferred task
//!   queue ("run on the next turn")
//! - **Signal/Slot System**: type-safe notifications for observers
//! - **Geometry**: points, sizes and rectangles in screen coordinates
//! - **Logging**: `tracing` targets and performance spans
//!
//! # Deferred Task Example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use typeahead_core::{EventLoop, LivenessFlag};
//!
//! let event_loop = EventLoop::new();
//! let owner_alive = LivenessFlag::new();
//! let log = Rc::new(RefCell::new(Vec::new()));
//!
//! let flag = owner_alive.clone();
//! let sink = log.clone();
//! event_loop.post_task(move || {
//!     if !flag.is_alive() {
//!         return;
//!     }
//!     sink.borrow_mut().push("checked");
//! });
//!
//! owner_alive.revoke();
//! event_loop.run_turn();
//! assert!(log.borrow().is_empty());
//! ```

mod error;
pub mod event_loop;
pub mod geometry;
pub mod logging;
pub mod signal;
mod task;

pub use error::{CoreError, Result};
pub use event_loop::{EventLoop, LivenessFlag, LoopHandle};
pub use geometry::{Point, Rect, Size};
pub use logging::PerfSpan;
pub use signal::{ConnectionId, Signal};
pub use task::{TaskId, TaskQueue};
