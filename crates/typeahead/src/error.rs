//! Error types for the autocomplete controller.
//!
//! None of these errors ever reach the end user on the keystroke path: the
//! controller logs them and degrades to "popup not shown". They are public so
//! that hosts calling the fallible variants (for example
//! [`try_commit`](crate::AutocompleteController::try_commit)) can react.

use std::path::PathBuf;

/// Result type alias for autocomplete operations.
pub type Result<T> = std::result::Result<T, AssistError>;

/// Errors raised by suggestion providers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// The provider could not produce suggestions.
    #[error("Suggestion provider failed: {0}")]
    Failed(String),

    /// The provider panicked while computing suggestions.
    #[error("Suggestion provider panicked: {0}")]
    Panicked(String),

    /// The background worker running the provider is gone.
    #[error("Suggestion worker disconnected")]
    Disconnected,
}

impl ProviderError {
    /// Create a generic failure.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file could not be read or written.
    #[error("Failed to access config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML could not be parsed into a configuration.
    #[error("Invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// Configuration could not be serialized.
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A field holds a value outside its valid range.
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue {
        field: &'static str,
        message: String,
    },
}

impl ConfigError {
    /// Create an invalid-value error.
    pub fn invalid_value(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            message: message.into(),
        }
    }
}

/// The main error type for autocomplete operations.
#[derive(Debug, thiserror::Error)]
pub enum AssistError {
    /// The provider failed; treated as "no suggestions".
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// A commit was requested for an index outside the shown list.
    #[error("Commit index {index} out of range for {len} items")]
    InvalidCommitIndex { index: usize, len: usize },

    /// A commit was requested while the popup was hidden.
    #[error("Cannot commit while the popup is hidden")]
    PopupHidden,

    /// The host was torn down before a deferred check ran.
    #[error("Host has been disposed")]
    DisposedHost,

    /// The background worker thread could not be started.
    #[error("Failed to spawn suggestion worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
