//! Error types for the Typeahead core.

/// The main error type for core operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// The event loop a handle points at has been dropped.
    #[error("The event loop has already been dropped")]
    EventLoopGone,

    /// The loop still had pending tasks after the allowed number of turns.
    #[error("Event loop still busy after {turns} turns ({pending} tasks pending)")]
    Starved {
        /// Number of turns that were executed.
        turns: usize,
        /// Tasks still queued when the limit was hit.
        pending: usize,
    },

    /// The task ID is unknown or the task has already run.
    #[error("Invalid or already executed task ID")]
    InvalidTaskId,
}

/// A specialized Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
