//! The cache handle: construction, the resolve/insert protocol, and the
//! runtime control surface.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────────┐
//! │                            GenCache<K, V>                             │
//! │                                                                       │
//! │  lookup path (caller thread, read locks only)                         │
//! │    keys ──▶ ring walk newest→oldest ──▶ {hits, residual misses}       │
//! │                    │                          │                       │
//! │                    │                          ▼                       │
//! │                    │                resolver.resolve(misses)          │
//! │                    │                          │                       │
//! │                    ▼                          ▼                       │
//! │              merged result ◀─────── normalize nil → Negative          │
//! │                                               │                       │
//! │                                               ▼                       │
//! │                            Install enqueued to control thread         │
//! │                                                                       │
//! │  control thread (driver): install / delete / clear / set-resolver     │
//! │  applied in enqueue order, rotation every generation period           │
//! └───────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Consistency
//!
//! Mutations return as soon as they are enqueued. A lookup that starts
//! after an install was *applied* observes it; one racing the queue may
//! miss and resolve again. Concurrent misses for the same key can each
//! invoke the resolver, and the last installed result wins. [`sync`]
//! (`GenCache::sync`) is the barrier for callers (and tests) that need
//! "applied", not "enqueued".

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::RwLock;
use rustc_hash::FxHashSet;

use crate::driver::{self, Command, DriverContext};
use crate::ds::{Cached, GenerationRing};
use crate::error::{ConfigError, ResolverError};
use crate::metrics::{CacheCounters, CacheMetrics};
use crate::resolver::{Resolved, Resolver};

/// Configuration for [`GenCache::open`].
///
/// | Field | Meaning | Default |
/// |-------|---------|---------|
/// | `bucket_count` | Number of ring generations | 3 |
/// | `generation_period` | Time between rotations | 5 minutes |
///
/// An entry resolved now stays resident for at least one period and at
/// most `bucket_count` periods.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use gencache::cache::CacheOptions;
///
/// let opts = CacheOptions::new()
///     .with_bucket_count(4)
///     .with_generation_period(Duration::from_secs(60));
/// assert_eq!(opts.bucket_count, 4);
/// ```
#[derive(Debug, Clone)]
pub struct CacheOptions {
    /// Number of generations in the ring.
    pub bucket_count: usize,
    /// Period between ring rotations.
    pub generation_period: Duration,
}

impl CacheOptions {
    /// Creates options with the defaults (3 buckets, 5 minute period).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of ring generations.
    pub fn with_bucket_count(mut self, bucket_count: usize) -> Self {
        self.bucket_count = bucket_count;
        self
    }

    /// Sets the rotation period.
    pub fn with_generation_period(mut self, period: Duration) -> Self {
        self.generation_period = period;
        self
    }
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            bucket_count: 3,
            generation_period: Duration::from_secs(300),
        }
    }
}

/// A named generational cache instance.
///
/// Dropping the handle stops the expiry timer, ends the control thread,
/// and releases bucket storage. Two caches opened with distinct names
/// share nothing.
pub struct GenCache<K, V> {
    name: Arc<str>,
    ring: Arc<GenerationRing<K, V>>,
    resolver: Arc<RwLock<Arc<dyn Resolver<K, V>>>>,
    counters: Arc<CacheCounters>,
    commands: Sender<Command<K, V>>,
    driver: Option<JoinHandle<()>>,
}

impl<K, V> GenCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    /// Opens a cache instance.
    ///
    /// Allocates `bucket_count` empty buckets and arms the expiry tick.
    /// Rejects a zero bucket count or a zero period.
    ///
    /// # Example
    ///
    /// ```
    /// use gencache::cache::{CacheOptions, GenCache};
    /// use gencache::resolver::from_pairs;
    ///
    /// let cache = GenCache::open(
    ///     "greetings",
    ///     from_pairs(|keys: Vec<String>| {
    ///         Ok(keys
    ///             .into_iter()
    ///             .map(|k| {
    ///                 let value = format!("hello {k}");
    ///                 (k, value)
    ///             })
    ///             .collect::<Vec<_>>())
    ///     }),
    ///     CacheOptions::new(),
    /// )
    /// .unwrap();
    ///
    /// let value = cache.get("world".to_string()).unwrap();
    /// assert_eq!(value.as_deref().map(String::as_str), Some("hello world"));
    /// ```
    pub fn open(
        name: impl Into<String>,
        resolver: impl Resolver<K, V> + 'static,
        options: CacheOptions,
    ) -> Result<Self, ConfigError> {
        if options.bucket_count == 0 {
            return Err(ConfigError::new("bucket_count must be at least 1"));
        }
        if options.generation_period.is_zero() {
            return Err(ConfigError::new("generation_period must be non-zero"));
        }

        let name: Arc<str> = Arc::from(name.into());
        let ring = Arc::new(GenerationRing::new(options.bucket_count));
        let resolver: Arc<RwLock<Arc<dyn Resolver<K, V>>>> =
            Arc::new(RwLock::new(Arc::new(resolver)));
        let counters = Arc::new(CacheCounters::default());
        let (commands, receiver) = mpsc::channel();
        let driver = driver::spawn(
            DriverContext {
                name: Arc::clone(&name),
                ring: Arc::clone(&ring),
                resolver: Arc::clone(&resolver),
                counters: Arc::clone(&counters),
                period: options.generation_period,
            },
            receiver,
        );

        Ok(Self {
            name,
            ring,
            resolver,
            counters,
            commands,
            driver: Some(driver),
        })
    }

    /// The instance identifier, used in rotation log records.
    pub fn name(&self) -> &str {
        &self.name
    }

    // -----------------------------------------------------------------
    // Lookup path
    // -----------------------------------------------------------------

    /// Resolves a single key.
    ///
    /// Returns `Ok(None)` when the resolver answered `nil` for this key
    /// (the negative cache); a plain miss never errors, it resolves.
    pub fn get(&self, key: K) -> Result<Option<Arc<V>>, ResolverError> {
        Ok(self.get_tuple(key)?.1)
    }

    /// Like [`get`](Self::get), but hands the key back alongside the value.
    pub fn get_tuple(&self, key: K) -> Result<(K, Option<Arc<V>>), ResolverError> {
        if let Some(cached) = self.lookup_resident(&key) {
            return Ok((key, cached.value()));
        }

        self.counters.record_misses(1);
        self.counters.record_resolve();
        let pairs = self.get_resolver().resolve(vec![key.clone()])?;

        let mut answer = None;
        let mut install = Vec::with_capacity(pairs.len());
        for Resolved { key: pair_key, value } in pairs {
            let cached = Cached::from_option(value);
            if pair_key == key {
                answer = cached.value();
            }
            install.push((pair_key, cached));
        }
        if !install.is_empty() {
            let _ = self.commands.send(Command::Install(install));
        }
        Ok((key, answer))
    }

    /// Resolves a batch of keys, preserving the per-key association.
    ///
    /// Cache hits (including negative hits) are served from the ring;
    /// only the residual misses reach the resolver, in one batch. Keys
    /// the resolver omits are absent from the returned mapping and are
    /// not cached; extra pairs it volunteers are installed and included.
    pub fn get_many(&self, keys: Vec<K>) -> Result<HashMap<K, Option<Arc<V>>>, ResolverError> {
        let mut resolved: HashMap<K, Option<Arc<V>>> = HashMap::with_capacity(keys.len());

        // Dedup while keeping first-seen order; the result is a per-key
        // mapping, so duplicates carry no extra information.
        let mut seen = FxHashSet::default();
        let mut unresolved: Vec<K> = Vec::with_capacity(keys.len());
        for key in keys {
            if seen.insert(key.clone()) {
                unresolved.push(key);
            }
        }

        for bucket in self.ring.iter_newest_to_oldest() {
            if unresolved.is_empty() {
                break;
            }
            unresolved.retain(|key| match bucket.lookup(key) {
                Some(cached) => {
                    self.record_resident_hit(&cached);
                    resolved.insert(key.clone(), cached.value());
                    false
                }
                None => true,
            });
        }

        if unresolved.is_empty() {
            return Ok(resolved);
        }

        self.counters.record_misses(unresolved.len() as u64);
        self.counters.record_resolve();
        let pairs = self.get_resolver().resolve(unresolved)?;

        let mut install = Vec::with_capacity(pairs.len());
        for Resolved { key, value } in pairs {
            let cached = Cached::from_option(value);
            resolved.insert(key.clone(), cached.value());
            install.push((key, cached));
        }
        if !install.is_empty() {
            let _ = self.commands.send(Command::Install(install));
        }
        Ok(resolved)
    }

    /// Batched lookup returning `(key, value)` pairs in request order.
    ///
    /// Keys the resolver omitted are skipped, mirroring
    /// [`get_many`](Self::get_many).
    pub fn get_many_tuples(
        &self,
        keys: Vec<K>,
    ) -> Result<Vec<(K, Option<Arc<V>>)>, ResolverError> {
        let resolved = self.get_many(keys.clone())?;
        Ok(keys
            .into_iter()
            .filter_map(|key| {
                let value = resolved.get(&key)?.clone();
                Some((key, value))
            })
            .collect())
    }

    // -----------------------------------------------------------------
    // Runtime control surface (asynchronous: applied in enqueue order)
    // -----------------------------------------------------------------

    /// Installs pairs directly into the newest bucket.
    pub fn insert(&self, pairs: Vec<(K, V)>) {
        if pairs.is_empty() {
            return;
        }
        let install = pairs
            .into_iter()
            .map(|(key, value)| (key, Cached::present(value)))
            .collect();
        let _ = self.commands.send(Command::Install(install));
    }

    /// Removes `key` from every bucket.
    pub fn delete(&self, key: K) {
        let _ = self.commands.send(Command::Delete(key));
    }

    /// Empties every bucket, leaving ring positions intact.
    pub fn clear(&self) {
        let _ = self.commands.send(Command::Clear);
    }

    /// Replaces the resolver used for subsequent misses.
    ///
    /// Entries resolved by the previous resolver remain until eviction.
    pub fn set_resolver(&self, resolver: impl Resolver<K, V> + 'static) {
        let _ = self.commands.send(Command::SetResolver(Arc::new(resolver)));
    }

    /// The resolver currently used for misses (synchronous read).
    pub fn get_resolver(&self) -> Arc<dyn Resolver<K, V>> {
        Arc::clone(&self.resolver.read())
    }

    /// Barrier: returns once every previously enqueued control operation
    /// has been applied.
    pub fn sync(&self) {
        let (done, wait) = mpsc::channel();
        if self.commands.send(Command::Sync(done)).is_ok() {
            let _ = wait.recv();
        }
    }

    // -----------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------

    /// Snapshot of the cache activity counters.
    pub fn metrics(&self) -> CacheMetrics {
        self.counters.snapshot()
    }

    /// Slot indices from newest to oldest (tests and debugging only).
    pub fn inspect_order(&self) -> Vec<usize> {
        self.ring.order_newest_to_oldest()
    }

    /// Per-bucket listings from newest to oldest (tests and debugging
    /// only). Negative entries appear as `None` values.
    pub fn inspect_contents(&self) -> Vec<(usize, Vec<(K, Option<Arc<V>>)>)> {
        self.ring
            .order_newest_to_oldest()
            .into_iter()
            .map(|slot| {
                let entries = self
                    .ring
                    .slot(slot)
                    .entries()
                    .into_iter()
                    .map(|(key, cached)| (key, cached.value()))
                    .collect();
                (slot, entries)
            })
            .collect()
    }

    // -----------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------

    fn lookup_resident(&self, key: &K) -> Option<Cached<V>> {
        let cached = self.ring.lookup(key)?;
        self.record_resident_hit(&cached);
        Some(cached)
    }

    fn record_resident_hit(&self, cached: &Cached<V>) {
        if cached.is_negative() {
            self.counters.record_negative_hit();
        } else {
            self.counters.record_hit();
        }
    }
}

impl<K, V> fmt::Debug for GenCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenCache")
            .field("name", &self.name)
            .field("generations", &self.ring.generations())
            .finish_non_exhaustive()
    }
}

impl<K, V> Drop for GenCache<K, V> {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Shutdown);
        if let Some(driver) = self.driver.take() {
            let _ = driver.join();
        }
    }
}
