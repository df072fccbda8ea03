//! Concurrency primitives and request-scoped context.
//!
//! - Correlation identifiers via `RequestContext`
//! - A keyed memoization map (`KeyedOnceCache`) that shares the in-flight
//!   initialization future, so concurrent first-time requests for one key
//!   run the initializer at most once.
//!
//! Notes:
//! - There is no cancellation model: once an initializer starts it runs to
//!   completion or failure.
//! - A failed initialization is not cached; the next caller retries.

use crate::{ErrorCode, ErrorEnvelope, Result};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, OnceCell};

/// A correlation identifier used for logging.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(Arc<str>);

impl CorrelationId {
    /// Parse a correlation identifier from user input.
    ///
    /// The value is trimmed; empty values are rejected.
    pub fn parse(value: impl AsRef<str>) -> Result<Self> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ErrorEnvelope::expected(
                ErrorCode::invalid_input(),
                "correlationId must be non-empty",
            ));
        }
        Ok(Self(Arc::<str>::from(trimmed)))
    }

    /// Create a new request id, best-effort unique within this process.
    #[must_use]
    pub fn new_request_id() -> Self {
        let n = REQUEST_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(Arc::<str>::from(format!("req_{n}")))
    }

    /// Borrow the identifier as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

static REQUEST_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Request-scoped context passed across boundaries.
#[derive(Debug, Clone)]
pub struct RequestContext {
    correlation_id: CorrelationId,
}

impl RequestContext {
    /// Create a request context for an explicit correlation id.
    #[must_use]
    pub const fn new(correlation_id: CorrelationId) -> Self {
        Self { correlation_id }
    }

    /// Convenience constructor: create a context with an auto-generated `req_*` id.
    #[must_use]
    pub fn new_request() -> Self {
        Self::new(CorrelationId::new_request_id())
    }

    /// Return the correlation id.
    #[must_use]
    pub const fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }
}

/// Keyed memoization of asynchronous, fallible initializers.
///
/// Each key owns one `OnceCell`; the map lock is only held while the cell is
/// looked up, never across the initializer's await points.
pub struct KeyedOnceCache<K, V> {
    cells: Mutex<HashMap<K, Arc<OnceCell<Arc<V>>>>>,
}

impl<K, V> KeyedOnceCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cells: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached value for `key`, running `init` when nothing is cached.
    ///
    /// Concurrent callers for the same key wait on the in-flight initializer.
    /// When it fails, the error is returned to the caller that ran it and the
    /// cell stays empty, so a waiting caller runs its own initializer.
    pub async fn get_or_try_init<F, Fut>(&self, key: K, init: F) -> Result<Arc<V>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        let cell = {
            let mut cells = self.cells.lock().await;
            Arc::clone(cells.entry(key).or_insert_with(|| Arc::new(OnceCell::new())))
        };

        let value = cell
            .get_or_try_init(|| async { init().await.map(Arc::new) })
            .await?;
        Ok(Arc::clone(value))
    }

    /// Return the settled value for `key`, if any.
    pub async fn get(&self, key: &K) -> Option<Arc<V>> {
        let cells = self.cells.lock().await;
        cells.get(key).and_then(|cell| cell.get().cloned())
    }

    /// Number of settled entries.
    pub async fn len(&self) -> usize {
        let cells = self.cells.lock().await;
        cells.values().filter(|cell| cell.initialized()).count()
    }

    /// Returns true when no entry has settled.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop every entry.
    pub async fn clear(&self) {
        self.cells.lock().await.clear();
    }
}

impl<K, V> Default for KeyedOnceCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for KeyedOnceCache<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_struct("KeyedOnceCache").finish_non_exhaustive()
    }
}
