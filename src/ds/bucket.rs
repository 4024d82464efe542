//! One generation's key/value map.
//!
//! A bucket is a concurrent map from key to [`Cached`] value. Buckets carry
//! no timestamp; their age is implied by position in the
//! [`GenerationRing`](crate::ds::GenerationRing). Values are stored behind
//! `Arc` so lookups can hand out shared references without holding the
//! bucket lock.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────┐
//!   │                      Bucket<K, V>                        │
//!   │                                                          │
//!   │   map: RwLock<FxHashMap<K, Cached<V>>>                   │
//!   │                                                          │
//!   │   lookup(&k) ──▶ Present(Arc<V>) │ Negative │ absent     │
//!   │   insert(k, v)        overwrite, O(1) expected           │
//!   │   insert_many(pairs)  one write lock for the batch       │
//!   │   remove(&k)          point delete                       │
//!   │   clear()             bulk clear, returns prior size     │
//!   └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Notes
//! - `lookup` distinguishes three outcomes: a present value, a negative
//!   entry (resolver-confirmed absence), and an absent key (never resolved
//!   in this generation).
//! - Concurrent readers proceed alongside a single writer; the write lock
//!   is held only for the duration of the point operation.

use std::hash::Hash;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

/// A cached value: either present or resolver-confirmed absent.
///
/// `Negative` is not the same as a missing key. A missing key means
/// "unknown, must resolve"; `Negative` means the resolver already answered
/// `None` for this key and the answer is cached until the entry ages out.
#[derive(Debug)]
pub enum Cached<V> {
    /// A value returned by the resolver (or installed explicitly).
    Present(Arc<V>),
    /// The resolver confirmed no value exists for this key.
    Negative,
}

impl<V> Cached<V> {
    /// Wraps a value as a present entry.
    pub fn present(value: V) -> Self {
        Cached::Present(Arc::new(value))
    }

    /// Normalizes a resolver result: `Some` becomes present, `None` negative.
    pub fn from_option(value: Option<V>) -> Self {
        match value {
            Some(value) => Cached::present(value),
            None => Cached::Negative,
        }
    }

    /// Returns the value, or `None` for a negative entry.
    pub fn value(&self) -> Option<Arc<V>> {
        match self {
            Cached::Present(value) => Some(Arc::clone(value)),
            Cached::Negative => None,
        }
    }

    /// Returns `true` for a negative entry.
    pub fn is_negative(&self) -> bool {
        matches!(self, Cached::Negative)
    }
}

// Manual impl: cloning shares the Arc, so V itself need not be Clone.
impl<V> Clone for Cached<V> {
    fn clone(&self) -> Self {
        match self {
            Cached::Present(value) => Cached::Present(Arc::clone(value)),
            Cached::Negative => Cached::Negative,
        }
    }
}

/// A single generation: key → present-or-negative value.
#[derive(Debug)]
pub struct Bucket<K, V> {
    map: RwLock<FxHashMap<K, Cached<V>>>,
}

impl<K, V> Bucket<K, V> {
    /// Creates an empty bucket.
    pub fn new() -> Self {
        Self {
            map: RwLock::new(FxHashMap::default()),
        }
    }

    /// Returns the current number of entries.
    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    /// Returns `true` if the bucket holds no entries.
    pub fn is_empty(&self) -> bool {
        self.map.read().is_empty()
    }

    /// Removes every entry, returning the size before clearing.
    pub fn clear(&self) -> usize {
        let mut map = self.map.write();
        let len = map.len();
        map.clear();
        len
    }
}

impl<K, V> Bucket<K, V>
where
    K: Eq + Hash,
{
    /// Fetches the entry for `key`.
    ///
    /// `Some(Cached::Present(_))` is a hit, `Some(Cached::Negative)` a
    /// negative hit, `None` means the key is absent from this generation.
    pub fn lookup(&self, key: &K) -> Option<Cached<V>> {
        self.map.read().get(key).cloned()
    }

    /// Returns `true` if the bucket holds an entry for `key`.
    pub fn contains(&self, key: &K) -> bool {
        self.map.read().contains_key(key)
    }

    /// Inserts an entry, overwriting any previous one for the same key.
    pub fn insert(&self, key: K, value: Cached<V>) {
        self.map.write().insert(key, value);
    }

    /// Inserts a batch of entries under a single write lock.
    pub fn insert_many(&self, pairs: impl IntoIterator<Item = (K, Cached<V>)>) {
        let mut map = self.map.write();
        for (key, value) in pairs {
            map.insert(key, value);
        }
    }

    /// Removes the entry for `key`, returning whether one existed.
    pub fn remove(&self, key: &K) -> bool {
        self.map.write().remove(key).is_some()
    }
}

impl<K, V> Bucket<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Snapshots the bucket's entries (diagnostics and inspection only).
    pub fn entries(&self) -> Vec<(K, Cached<V>)> {
        self.map
            .read()
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

impl<K, V> Default for Bucket<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_lookup_distinguishes_present_negative_absent() {
        let bucket: Bucket<&str, i32> = Bucket::new();
        bucket.insert("hit", Cached::present(7));
        bucket.insert("gone", Cached::Negative);

        let hit = bucket.lookup(&"hit").expect("present entry");
        assert_eq!(hit.value().as_deref(), Some(&7));
        assert!(!hit.is_negative());

        let negative = bucket.lookup(&"gone").expect("negative entry");
        assert!(negative.is_negative());
        assert!(negative.value().is_none());

        assert!(bucket.lookup(&"unknown").is_none());
    }

    #[test]
    fn bucket_insert_overwrites() {
        let bucket: Bucket<&str, i32> = Bucket::new();
        bucket.insert("k", Cached::present(1));
        bucket.insert("k", Cached::present(2));
        assert_eq!(bucket.len(), 1);
        assert_eq!(bucket.lookup(&"k").unwrap().value().as_deref(), Some(&2));

        bucket.insert("k", Cached::Negative);
        assert!(bucket.lookup(&"k").unwrap().is_negative());
    }

    #[test]
    fn bucket_insert_many_installs_batch() {
        let bucket: Bucket<String, i32> = Bucket::new();
        bucket.insert_many(vec![
            ("a".to_string(), Cached::present(1)),
            ("b".to_string(), Cached::present(2)),
            ("c".to_string(), Cached::Negative),
        ]);
        assert_eq!(bucket.len(), 3);
        assert!(bucket.contains(&"a".to_string()));
        assert!(bucket.lookup(&"c".to_string()).unwrap().is_negative());
    }

    #[test]
    fn bucket_remove_reports_presence() {
        let bucket: Bucket<&str, i32> = Bucket::new();
        bucket.insert("k", Cached::present(1));
        assert!(bucket.remove(&"k"));
        assert!(!bucket.remove(&"k"));
        assert!(bucket.lookup(&"k").is_none());
    }

    #[test]
    fn bucket_clear_returns_prior_size() {
        let bucket: Bucket<&str, i32> = Bucket::new();
        bucket.insert("a", Cached::present(1));
        bucket.insert("b", Cached::Negative);
        assert_eq!(bucket.clear(), 2);
        assert!(bucket.is_empty());
        assert_eq!(bucket.clear(), 0);
    }

    #[test]
    fn bucket_entries_snapshot() {
        let bucket: Bucket<String, i32> = Bucket::new();
        bucket.insert("a".to_string(), Cached::present(1));
        bucket.insert("b".to_string(), Cached::Negative);

        let mut entries = bucket.entries();
        entries.sort_by(|(a, _), (b, _)| a.cmp(b));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].1.value().as_deref(), Some(&1));
        assert!(entries[1].1.is_negative());
    }

    #[test]
    fn cached_clone_shares_value() {
        let cached = Cached::present("shared".to_string());
        let clone = cached.clone();
        let a = cached.value().unwrap();
        let b = clone.value().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
