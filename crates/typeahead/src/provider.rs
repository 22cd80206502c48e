//! Suggestion providers.
//!
//! A [`SuggestionProvider`] maps the current input text to an ordered list of
//! candidate completions. The controller only consumes the output: matching,
//! ranking and data access are entirely the provider's business.
//!
//! Any closure `FnMut(&str) -> Result<Vec<String>, ProviderError>` is a
//! provider; [`from_fn`] adapts infallible closures. Stateful providers
//! implement the trait directly.
//!
//! # Example
//!
//! ```
//! use typeahead::provider::{from_fn, StringListProvider, SuggestionProvider};
//!
//! let mut fruits = StringListProvider::from(vec!["apple", "apricot", "banana"]);
//! assert_eq!(fruits.suggestions("ap").unwrap(), vec!["apple", "apricot"]);
//!
//! let mut echo = from_fn(|text: &str| vec![format!("{text}!")]);
//! assert_eq!(echo.suggestions("hi").unwrap(), vec!["hi!"]);
//! ```

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};

use typeahead_core::PerfSpan;
use typeahead_core::logging::targets;

use crate::error::ProviderError;

/// Maps input text to candidate completions.
///
/// Implementations must not call back into the controller that owns them.
/// They may return fewer, zero, or more items than the popup will show; the
/// controller truncates.
pub trait SuggestionProvider {
    /// Get the candidates for `text`, ordered by relevance.
    fn suggestions(&mut self, text: &str) -> Result<Vec<String>, ProviderError>;
}

impl<F> SuggestionProvider for F
where
    F: FnMut(&str) -> Result<Vec<String>, ProviderError>,
{
    fn suggestions(&mut self, text: &str) -> Result<Vec<String>, ProviderError> {
        self(text)
    }
}

/// Call `provider`, converting a panic into [`ProviderError::Panicked`].
///
/// Suggestions are a convenience: a misbehaving provider must never take the
/// text input down with it.
pub(crate) fn call_provider<P>(provider: &mut P, text: &str) -> Result<Vec<String>, ProviderError>
where
    P: SuggestionProvider + ?Sized,
{
    let _span = PerfSpan::new("provider_lookup");
    match catch_unwind(AssertUnwindSafe(|| provider.suggestions(text))) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic payload".to_string());
            Err(ProviderError::Panicked(message))
        }
    }
}

/// Adapter that turns an infallible closure into a provider.
///
/// Created by [`from_fn`].
#[derive(Debug, Clone)]
pub struct FnProvider<F> {
    f: F,
}

/// Wrap an infallible closure as a [`SuggestionProvider`].
pub fn from_fn<F>(f: F) -> FnProvider<F>
where
    F: FnMut(&str) -> Vec<String>,
{
    FnProvider { f }
}

impl<F> SuggestionProvider for FnProvider<F>
where
    F: FnMut(&str) -> Vec<String>,
{
    fn suggestions(&mut self, text: &str) -> Result<Vec<String>, ProviderError> {
        Ok((self.f)(text))
    }
}

// ============================================================================
// String List Provider
// ============================================================================

/// Controls how prefix matching handles letter case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaseSensitivity {
    /// "App" won't match "apple".
    CaseSensitive,
    /// "App" will match "apple".
    #[default]
    CaseInsensitive,
}

/// A provider backed by a fixed list of strings, matched by prefix.
///
/// Candidates keep the order of the backing list.
#[derive(Debug, Clone, Default)]
pub struct StringListProvider {
    items: Vec<String>,
    case_sensitivity: CaseSensitivity,
}

impl StringListProvider {
    /// Create a provider over the given items.
    pub fn new(items: Vec<String>) -> Self {
        Self {
            items,
            case_sensitivity: CaseSensitivity::default(),
        }
    }

    /// Set case sensitivity using builder pattern.
    pub fn with_case_sensitivity(mut self, sensitivity: CaseSensitivity) -> Self {
        self.case_sensitivity = sensitivity;
        self
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn set_items(&mut self, items: Vec<String>) {
        self.items = items;
    }

    pub fn add_item(&mut self, item: impl Into<String>) {
        self.items.push(item.into());
    }

    fn matches(&self, prefix: &str) -> Vec<String> {
        match self.case_sensitivity {
            CaseSensitivity::CaseSensitive => self
                .items
                .iter()
                .filter(|item| item.starts_with(prefix))
                .cloned()
                .collect(),
            CaseSensitivity::CaseInsensitive => {
                let prefix_lower = prefix.to_lowercase();
                self.items
                    .iter()
                    .filter(|item| item.to_lowercase().starts_with(&prefix_lower))
                    .cloned()
                    .collect()
            }
        }
    }
}

impl SuggestionProvider for StringListProvider {
    fn suggestions(&mut self, text: &str) -> Result<Vec<String>, ProviderError> {
        Ok(self.matches(text))
    }
}

impl From<Vec<String>> for StringListProvider {
    fn from(items: Vec<String>) -> Self {
        Self::new(items)
    }
}

impl From<Vec<&str>> for StringListProvider {
    fn from(items: Vec<&str>) -> Self {
        Self::new(items.into_iter().map(String::from).collect())
    }
}

// ============================================================================
// Caching Provider
// ============================================================================

/// Default number of distinct inputs a [`CachingProvider`] remembers.
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Memoizes an inner provider per input text.
///
/// Errors are never cached. When the cache is full it is flushed wholesale;
/// typing sessions revisit recent prefixes, so a simple flush keeps the hot
/// set without bookkeeping.
#[derive(Debug)]
pub struct CachingProvider<P> {
    inner: P,
    cache: HashMap<String, Vec<String>>,
    capacity: usize,
    hits: u64,
    misses: u64,
}

impl<P: SuggestionProvider> CachingProvider<P> {
    /// Wrap `inner` with the default capacity.
    pub fn new(inner: P) -> Self {
        Self::with_capacity(inner, DEFAULT_CACHE_CAPACITY)
    }

    /// Wrap `inner`, remembering at most `capacity` inputs.
    pub fn with_capacity(inner: P, capacity: usize) -> Self {
        Self {
            inner,
            cache: HashMap::new(),
            capacity: capacity.max(1),
            hits: 0,
            misses: 0,
        }
    }

    /// Drop every cached result.
    pub fn clear(&mut self) {
        self.cache.clear();
    }

    /// Number of lookups answered from the cache.
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Number of lookups forwarded to the inner provider.
    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Mutable access to the inner provider. Clears the cache, since the
    /// caller may change what the provider returns.
    pub fn inner_mut(&mut self) -> &mut P {
        self.cache.clear();
        &mut self.inner
    }
}

impl<P: SuggestionProvider> SuggestionProvider for CachingProvider<P> {
    fn suggestions(&mut self, text: &str) -> Result<Vec<String>, ProviderError> {
        if let Some(cached) = self.cache.get(text) {
            self.hits += 1;
            return Ok(cached.clone());
        }

        self.misses += 1;
        let result = self.inner.suggestions(text)?;
        if self.cache.len() >= self.capacity {
            tracing::trace!(target: targets::PROVIDER, capacity = self.capacity, "flushing suggestion cache");
            self.cache.clear();
        }
        self.cache.insert(text.to_string(), result.clone());
        Ok(result)
    }
}
