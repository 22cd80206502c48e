//! Configuration for the autocomplete controller.
//!
//! [`AssistConfig`] can be built in code with the `with_*` builders or loaded
//! from TOML. Every field has a default, so a config file only needs the
//! values it changes:
//!
//! ```toml
//! max_visible_items = 6
//!
//! [metrics]
//! item_height = 20.0
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use typeahead_core::Size;
use typeahead_core::logging::targets;

use crate::error::ConfigError;
use crate::positioner::DEFAULT_POPUP_OVERLAP;

/// Default maximum number of suggestions shown at once.
pub const DEFAULT_MAX_VISIBLE_ITEMS: usize = 10;

/// Sizing used to estimate the popup's size when the host does not measure
/// it itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopupMetrics {
    /// Height of one row in pixels.
    pub item_height: f32,
    /// Border width on each side in pixels.
    pub border: f32,
    /// The popup is never narrower than this.
    pub min_width: f32,
}

impl Default for PopupMetrics {
    fn default() -> Self {
        Self {
            item_height: 24.0,
            border: 1.0,
            min_width: 150.0,
        }
    }
}

impl PopupMetrics {
    /// Estimated popup size for `item_count` rows under an input `anchor_width` wide.
    pub fn popup_size(&self, item_count: usize, anchor_width: f32) -> Size {
        Size::new(
            anchor_width.max(self.min_width),
            item_count as f32 * self.item_height + 2.0 * self.border,
        )
    }
}

/// Autocomplete controller configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistConfig {
    /// Maximum number of suggestions shown; extra candidates are discarded.
    pub max_visible_items: usize,
    /// Pixels the popup overlaps the bottom edge of the input.
    pub popup_overlap: f32,
    /// Sizing used by the default popup measurement.
    pub metrics: PopupMetrics,
}

impl Default for AssistConfig {
    fn default() -> Self {
        Self {
            max_visible_items: DEFAULT_MAX_VISIBLE_ITEMS,
            popup_overlap: DEFAULT_POPUP_OVERLAP,
            metrics: PopupMetrics::default(),
        }
    }
}

impl AssistConfig {
    /// Set maximum visible items using builder pattern.
    pub fn with_max_visible_items(mut self, count: usize) -> Self {
        self.max_visible_items = count;
        self
    }

    /// Set the popup overlap using builder pattern.
    pub fn with_popup_overlap(mut self, overlap: f32) -> Self {
        self.popup_overlap = overlap;
        self
    }

    /// Set the popup metrics using builder pattern.
    pub fn with_metrics(mut self, metrics: PopupMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// Check that every field is within range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_visible_items == 0 {
            return Err(ConfigError::invalid_value(
                "max_visible_items",
                "must be at least 1",
            ));
        }
        check_length("popup_overlap", self.popup_overlap)?;
        check_length("metrics.item_height", self.metrics.item_height)?;
        check_length("metrics.border", self.metrics.border)?;
        check_length("metrics.min_width", self.metrics.min_width)?;
        Ok(())
    }

    /// Parse and validate a configuration from TOML.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(target: targets::CONFIG, path = %path.display(), ?config, "loaded config");
        Ok(config)
    }

    /// Serialize to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write the configuration to a file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let text = self.to_toml_string()?;
        std::fs::write(path, text).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn check_length(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::invalid_value(
            field,
            format!("must be a finite, non-negative number (got {value})"),
        ));
    }
    Ok(())
}
