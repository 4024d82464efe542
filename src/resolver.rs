//! The resolver seam: batch resolution of cache misses.
//!
//! A resolver turns a batch of keys into a batch of [`Resolved`] pairs.
//! It is supplied at construction, replaceable at runtime, and always
//! invoked in the calling thread with no cache lock held.
//!
//! ## Result shapes
//!
//! The resolver contract is deliberately forgiving about pair shapes:
//! a result item may be a plain `(key, value)` hit or a
//! `(key, Option<value>)` pair where `None` marks a confirmed absence.
//! Both convert into [`Resolved`], and [`from_pairs`] lifts any closure
//! producing convertible pairs into a [`Resolver`]:
//!
//! ```
//! use gencache::resolver::{from_pairs, Resolver};
//!
//! // Plain hits.
//! let hits = from_pairs(|keys: Vec<u32>| {
//!     Ok(keys.into_iter().map(|k| (k, k * 10)).collect::<Vec<_>>())
//! });
//! let pairs = hits.resolve(vec![1, 2]).unwrap();
//! assert_eq!(pairs[0].value, Some(10));
//!
//! // Optional values; `None` becomes a negative cache entry.
//! let sparse = from_pairs(|keys: Vec<u32>| {
//!     Ok(keys
//!         .into_iter()
//!         .map(|k| (k, (k % 2 == 0).then_some(k)))
//!         .collect::<Vec<_>>())
//! });
//! let pairs = sparse.resolve(vec![1, 2]).unwrap();
//! assert_eq!(pairs[0].value, None);
//! assert_eq!(pairs[1].value, Some(2));
//! ```
//!
//! ## Contract
//!
//! - The resolver may return fewer pairs than requested; omitted keys are
//!   neither cached nor reported, and a later lookup resolves them again.
//! - Pairs for keys that were not requested are still installed.
//! - Failure aborts the whole lookup; nothing is installed.

use std::marker::PhantomData;

use crate::error::ResolverError;

/// One resolver result: a key plus its value-or-absence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<K, V> {
    /// The key this pair answers.
    pub key: K,
    /// The value; `None` means the resolver confirmed absence.
    pub value: Option<V>,
}

impl<K, V> Resolved<K, V> {
    /// A present pair.
    pub fn hit(key: K, value: V) -> Self {
        Self {
            key,
            value: Some(value),
        }
    }

    /// A confirmed-absence pair (becomes a negative cache entry).
    pub fn negative(key: K) -> Self {
        Self { key, value: None }
    }
}

impl<K, V> From<(K, V)> for Resolved<K, V> {
    fn from((key, value): (K, V)) -> Self {
        Resolved::hit(key, value)
    }
}

impl<K, V> From<(K, Option<V>)> for Resolved<K, V> {
    fn from((key, value): (K, Option<V>)) -> Self {
        Resolved { key, value }
    }
}

/// Batch resolution of cache misses.
///
/// Implementations must be shareable across threads: the cache keeps the
/// current resolver behind an `Arc` and every caller thread may invoke it.
pub trait Resolver<K, V>: Send + Sync {
    /// Resolves a batch of keys.
    ///
    /// See the module docs for the contract on omitted and extra keys.
    fn resolve(&self, keys: Vec<K>) -> Result<Vec<Resolved<K, V>>, ResolverError>;
}

impl<K, V, F> Resolver<K, V> for F
where
    F: Fn(Vec<K>) -> Result<Vec<Resolved<K, V>>, ResolverError> + Send + Sync,
{
    fn resolve(&self, keys: Vec<K>) -> Result<Vec<Resolved<K, V>>, ResolverError> {
        self(keys)
    }
}

/// Adapter produced by [`from_pairs`].
///
/// Normalizes whatever pair shape the wrapped closure returns into
/// [`Resolved`] pairs.
pub struct PairsFn<F, I> {
    resolve: F,
    _pairs: PhantomData<fn() -> I>,
}

impl<F, I> std::fmt::Debug for PairsFn<F, I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PairsFn").finish_non_exhaustive()
    }
}

/// Lifts a closure returning any convertible pair shape into a [`Resolver`].
///
/// This is the input-normalization step for heterogeneous resolver results:
/// the closure may yield `(K, V)` or `(K, Option<V>)` items and the adapter
/// converts each into a [`Resolved`] pair.
pub fn from_pairs<F, I>(resolve: F) -> PairsFn<F, I> {
    PairsFn {
        resolve,
        _pairs: PhantomData,
    }
}

impl<K, V, F, I> Resolver<K, V> for PairsFn<F, I>
where
    F: Fn(Vec<K>) -> Result<I, ResolverError> + Send + Sync,
    I: IntoIterator,
    I::Item: Into<Resolved<K, V>>,
{
    fn resolve(&self, keys: Vec<K>) -> Result<Vec<Resolved<K, V>>, ResolverError> {
        let pairs = (self.resolve)(keys)?;
        Ok(pairs.into_iter().map(Into::into).collect())
    }
}
