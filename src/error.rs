//! Error types for the gencache library.
//!
//! ## Key Components
//!
//! - [`ConfigError`]: Returned when cache configuration parameters are invalid
//!   (e.g. zero bucket count, zero generation period).
//! - [`ResolverError`]: Returned when a resolver invocation fails. Propagated
//!   to the caller of `get`/`get_many`; nothing is installed and nothing is
//!   retried.
//!
//! Negative resolver results (`None` values) are *not* errors; they become
//! first-class negative cache entries.
//!
//! ## Example Usage
//!
//! ```
//! use gencache::error::ResolverError;
//!
//! let err = ResolverError::new("directory backend unavailable");
//! assert!(err.to_string().contains("unavailable"));
//! ```

use std::fmt;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when cache configuration parameters are invalid.
///
/// Produced by [`GenCache::open`](crate::cache::GenCache::open) when the
/// options fail validation. Carries a human-readable description of which
/// parameter failed.
///
/// # Example
///
/// ```
/// use gencache::cache::{CacheOptions, GenCache};
/// use gencache::resolver::from_pairs;
///
/// let opts = CacheOptions::new().with_bucket_count(0);
/// let err = GenCache::<String, String>::open(
///     "bad",
///     from_pairs(|keys: Vec<String>| Ok(keys.into_iter().map(|k| (k, None)).collect::<Vec<_>>())),
///     opts,
/// )
/// .unwrap_err();
/// assert!(err.to_string().contains("bucket_count"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// ResolverError
// ---------------------------------------------------------------------------

/// Error returned when a resolver invocation fails.
///
/// Resolvers may wrap an underlying failure (a database error, a timeout)
/// via [`with_source`](ResolverError::with_source); the source is reachable
/// through [`std::error::Error::source`] for callers that want to inspect it.
#[derive(Debug)]
pub struct ResolverError {
    message: String,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ResolverError {
    /// Creates a new `ResolverError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            source: None,
        }
    }

    /// Creates a `ResolverError` wrapping an underlying failure.
    pub fn with_source(
        msg: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            message: msg.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ResolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ResolverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|err| err.as_ref() as &(dyn std::error::Error + 'static))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
