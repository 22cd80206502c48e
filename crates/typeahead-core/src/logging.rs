//! Logging facilities for Typeahead.
//!
//! Typeahead uses the `tracing` crate for instrumentation and never installs
//! a subscriber itself. To see logs, install one in your application:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("typeahead=debug,typeahead_core=trace")
//!     .init();
//! ```

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core framework target.
    pub const CORE: &str = "typeahead_core";
    /// Event loop target.
    pub const EVENT_LOOP: &str = "typeahead_core::event_loop";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "typeahead_core::signal";
    /// Autocomplete controller target.
    pub const CONTROLLER: &str = "typeahead::controller";
    /// Suggestion provider target.
    pub const PROVIDER: &str = "typeahead::provider";
    /// Popup positioner target.
    pub const POSITIONER: &str = "typeahead::positioner";
    /// Configuration loading target.
    pub const CONFIG: &str = "typeahead::config";
}

/// A guard that keeps a tracing span entered until it is dropped.
///
/// This is useful for tracking the duration of operations such as a
/// provider lookup.
#[derive(Debug)]
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create a new performance span.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: "typeahead::perf", "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }
}
