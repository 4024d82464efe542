//! Generation ring: fixed bucket slots with an advancing newest cursor.
//!
//! The ring holds exactly `N` [`Bucket`]s and an integer cursor marking the
//! newest slot; the oldest slot sits at `(cursor + 1) % N`. Rotation clears
//! the oldest bucket and republishes it as the new newest: an O(1) cursor
//! update, buckets themselves never move.
//!
//! ## Architecture
//!
//! ```text
//!   slots: [ B0 ] [ B1 ] [ B2 ]          N = 3
//!                   ▲
//!                 cursor = 1 (newest)
//!
//!   read order  (newest → oldest):  B1, B0, B2
//!   rotate():   clear B2, cursor = 2
//!   read order  afterwards:         B2, B1, B0
//! ```
//!
//! ## Rotation Flow
//!
//! ```text
//!   rotate()
//!      │
//!      ▼
//!   expired = (cursor + 1) % N      the oldest slot
//!   expired.clear()                 entries from N generations ago drop
//!   cursor  = expired               expired slot becomes the newest
//! ```
//!
//! An entry therefore survives at least one full period (it is never in the
//! slot being cleared right after install) and at most `N` periods.
//!
//! ## Notes
//! - The cursor is atomic so readers can walk the ring without contending
//!   on the control thread; only the expiry driver stores to it.
//! - Reads stop at the first bucket containing the key. A key re-resolved
//!   over several generations sits nearest the newest end, so the first hit
//!   is the freshest copy.
//! - `debug_validate_invariants()` is available in debug/test builds.

use std::hash::Hash;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::ds::bucket::{Bucket, Cached};

/// Outcome of one rotation, consumed by the expiry driver's log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationReport {
    /// Slot that was cleared (its entries expired).
    pub expired_slot: usize,
    /// Number of entries the expired slot held before clearing.
    pub expired_len: usize,
    /// Newest slot after the rotation (same index as `expired_slot`).
    pub newest: usize,
    /// Oldest slot after the rotation.
    pub oldest: usize,
}

/// Ring of `N` generation buckets with newest/oldest pointers.
#[derive(Debug)]
pub struct GenerationRing<K, V> {
    slots: Box<[Bucket<K, V>]>,
    cursor: AtomicUsize,
}

impl<K, V> GenerationRing<K, V> {
    /// Creates a ring of `generations` empty buckets.
    ///
    /// Callers validate `generations >= 1`; the cache constructor rejects
    /// zero before reaching this point.
    pub fn new(generations: usize) -> Self {
        debug_assert!(generations >= 1, "ring requires at least one bucket");
        let mut slots = Vec::with_capacity(generations);
        slots.resize_with(generations, Bucket::new);
        Self {
            slots: slots.into_boxed_slice(),
            cursor: AtomicUsize::new(0),
        }
    }

    /// Returns the number of buckets (fixed at construction).
    pub fn generations(&self) -> usize {
        self.slots.len()
    }

    /// Index of the current newest slot.
    pub fn newest_index(&self) -> usize {
        self.cursor.load(Ordering::Acquire)
    }

    /// Index of the current oldest slot (next to expire).
    pub fn oldest_index(&self) -> usize {
        (self.newest_index() + 1) % self.generations()
    }

    /// The current insert target.
    pub fn newest(&self) -> &Bucket<K, V> {
        &self.slots[self.newest_index()]
    }

    /// A bucket by slot index (diagnostics and inspection only).
    pub fn slot(&self, index: usize) -> &Bucket<K, V> {
        &self.slots[index]
    }

    /// The read path: buckets from newest to oldest.
    ///
    /// The cursor is sampled once up front; a rotation landing mid-walk
    /// shifts staleness by at most one period, never corrupts the order.
    pub fn iter_newest_to_oldest(&self) -> impl Iterator<Item = &Bucket<K, V>> {
        let generations = self.generations();
        let newest = self.newest_index();
        (0..generations).map(move |age| &self.slots[(newest + generations - age) % generations])
    }

    /// Slot indices from newest to oldest.
    pub fn order_newest_to_oldest(&self) -> Vec<usize> {
        let generations = self.generations();
        let newest = self.newest_index();
        (0..generations)
            .map(|age| (newest + generations - age) % generations)
            .collect()
    }

    /// Clears the oldest bucket and promotes it to newest.
    ///
    /// Only the expiry driver calls this; the returned report feeds its
    /// rotation log record.
    pub fn rotate(&self) -> RotationReport {
        let generations = self.generations();
        let expired = (self.cursor.load(Ordering::Acquire) + 1) % generations;
        let expired_len = self.slots[expired].clear();
        self.cursor.store(expired, Ordering::Release);
        RotationReport {
            expired_slot: expired,
            expired_len,
            newest: expired,
            oldest: (expired + 1) % generations,
        }
    }

    /// Empties every bucket; ring positions are unchanged.
    pub fn clear_all(&self) {
        for bucket in self.slots.iter() {
            bucket.clear();
        }
    }

    /// Total entries across all buckets.
    pub fn len(&self) -> usize {
        self.slots.iter().map(Bucket::len).sum()
    }

    /// Returns `true` if every bucket is empty.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Bucket::is_empty)
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        assert!(!self.slots.is_empty());
        assert!(self.newest_index() < self.generations());

        // The read order must visit every slot exactly once.
        let order = self.order_newest_to_oldest();
        let mut seen = vec![false; self.generations()];
        for index in &order {
            assert!(!seen[*index], "slot visited twice in read order");
            seen[*index] = true;
        }
        assert_eq!(order[0], self.newest_index());
        if self.generations() >= 2 {
            assert_eq!(order[self.generations() - 1], self.oldest_index());
            assert_ne!(self.newest_index(), self.oldest_index());
        }
    }
}

impl<K, V> GenerationRing<K, V>
where
    K: Eq + Hash,
{
    /// Walks newest→oldest and returns the first entry found for `key`.
    pub fn lookup(&self, key: &K) -> Option<Cached<V>> {
        self.iter_newest_to_oldest()
            .find_map(|bucket| bucket.lookup(key))
    }

    /// Removes `key` from every bucket (explicit invalidation).
    ///
    /// Returns `true` if any bucket held the key.
    pub fn delete_from_all(&self, key: &K) -> bool {
        let mut removed = false;
        for bucket in self.slots.iter() {
            removed |= bucket.remove(key);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn present(value: i32) -> Cached<i32> {
        Cached::present(value)
    }

    #[test]
    fn ring_new_allocates_empty_buckets() {
        let ring: GenerationRing<&str, i32> = GenerationRing::new(3);
        assert_eq!(ring.generations(), 3);
        assert_eq!(ring.newest_index(), 0);
        assert_eq!(ring.oldest_index(), 1);
        assert!(ring.is_empty());
        ring.debug_validate_invariants();
    }

    #[test]
    fn ring_rotate_clears_oldest_and_promotes() {
        let ring: GenerationRing<&str, i32> = GenerationRing::new(3);
        ring.newest().insert("a", present(1));

        let report = ring.rotate();
        assert_eq!(report.expired_slot, 1);
        assert_eq!(report.expired_len, 0);
        assert_eq!(ring.newest_index(), 1);
        assert_eq!(ring.oldest_index(), 2);

        // "a" aged one generation but is still resident.
        assert!(ring.lookup(&"a").is_some());
        ring.debug_validate_invariants();
    }

    #[test]
    fn ring_entry_expires_after_full_cycle() {
        let ring: GenerationRing<&str, i32> = GenerationRing::new(3);
        ring.newest().insert("a", present(1));

        ring.rotate();
        ring.rotate();
        assert!(ring.lookup(&"a").is_some());

        // Third rotation clears the slot "a" was installed into.
        let report = ring.rotate();
        assert_eq!(report.expired_len, 1);
        assert!(ring.lookup(&"a").is_none());
    }

    #[test]
    fn ring_read_order_is_newest_first() {
        let ring: GenerationRing<&str, i32> = GenerationRing::new(3);
        ring.newest().insert("k", present(1));
        ring.rotate();
        // A fresher copy in the new newest bucket shadows the older one.
        ring.newest().insert("k", present(2));

        let hit = ring.lookup(&"k").expect("resident");
        assert_eq!(hit.value().as_deref(), Some(&2));

        let order = ring.order_newest_to_oldest();
        assert_eq!(order.len(), 3);
        assert_eq!(order[0], ring.newest_index());
    }

    #[test]
    fn ring_delete_from_all_removes_every_copy() {
        let ring: GenerationRing<&str, i32> = GenerationRing::new(3);
        ring.newest().insert("k", present(1));
        ring.rotate();
        ring.newest().insert("k", present(2));

        assert!(ring.delete_from_all(&"k"));
        assert!(ring.lookup(&"k").is_none());
        assert!(!ring.delete_from_all(&"k"));
    }

    #[test]
    fn ring_clear_all_keeps_positions() {
        let ring: GenerationRing<&str, i32> = GenerationRing::new(3);
        ring.rotate();
        let newest_before = ring.newest_index();
        ring.newest().insert("a", present(1));
        ring.slot(ring.oldest_index()).insert("b", present(2));

        ring.clear_all();
        assert!(ring.is_empty());
        assert_eq!(ring.newest_index(), newest_before);
    }

    #[test]
    fn ring_single_bucket_rotation_drops_everything() {
        let ring: GenerationRing<&str, i32> = GenerationRing::new(1);
        ring.newest().insert("a", present(1));
        assert_eq!(ring.newest_index(), ring.oldest_index());

        let report = ring.rotate();
        assert_eq!(report.expired_slot, 0);
        assert_eq!(report.expired_len, 1);
        assert!(ring.is_empty());
        ring.debug_validate_invariants();
    }

    #[test]
    fn ring_rotation_report_indices_are_consistent() {
        let ring: GenerationRing<&str, i32> = GenerationRing::new(4);
        for _ in 0..9 {
            let report = ring.rotate();
            assert_eq!(report.newest, ring.newest_index());
            assert_eq!(report.oldest, ring.oldest_index());
            assert_eq!(report.oldest, (report.newest + 1) % 4);
            ring.debug_validate_invariants();
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Insert(u8, i32),
            Delete(u8),
            Rotate,
            Clear,
        }

        fn op_strategy() -> impl Strategy<Value = Op> {
            prop_oneof![
                (any::<u8>(), any::<i32>()).prop_map(|(k, v)| Op::Insert(k, v)),
                any::<u8>().prop_map(Op::Delete),
                Just(Op::Rotate),
                Just(Op::Clear),
            ]
        }

        proptest! {
            /// The ring always holds exactly N buckets and a valid cursor.
            #[test]
            fn prop_ring_size_stable(
                generations in 1usize..8,
                ops in prop::collection::vec(op_strategy(), 0..200)
            ) {
                let ring: GenerationRing<u8, i32> = GenerationRing::new(generations);
                for op in ops {
                    match op {
                        Op::Insert(k, v) => ring.newest().insert(k, Cached::present(v)),
                        Op::Delete(k) => { ring.delete_from_all(&k); },
                        Op::Rotate => { ring.rotate(); },
                        Op::Clear => ring.clear_all(),
                    }
                    prop_assert_eq!(ring.generations(), generations);
                    ring.debug_validate_invariants();
                }
            }

            /// A key lives for at least one and at most N rotations.
            #[test]
            fn prop_bounded_lifetime(
                generations in 1usize..6,
                warmup in 0usize..12
            ) {
                let ring: GenerationRing<&str, i32> = GenerationRing::new(generations);
                for _ in 0..warmup {
                    ring.rotate();
                }
                ring.newest().insert("k", Cached::present(1));

                for _ in 0..generations.saturating_sub(1) {
                    ring.rotate();
                    prop_assert!(ring.lookup(&"k").is_some());
                }
                ring.rotate();
                prop_assert!(ring.lookup(&"k").is_none());
            }

            /// Delete twice behaves like delete once.
            #[test]
            fn prop_delete_idempotent(rotations in 0usize..6) {
                let ring: GenerationRing<&str, i32> = GenerationRing::new(3);
                ring.newest().insert("k", Cached::present(1));
                for _ in 0..rotations.min(2) {
                    ring.rotate();
                }
                ring.delete_from_all(&"k");
                ring.delete_from_all(&"k");
                prop_assert!(ring.lookup(&"k").is_none());
            }

            /// After clear_all, every key is absent from every bucket.
            #[test]
            fn prop_clear_totality(
                keys in prop::collection::vec(any::<u8>(), 0..64),
                rotations in 0usize..4
            ) {
                let ring: GenerationRing<u8, i32> = GenerationRing::new(3);
                for (i, key) in keys.iter().enumerate() {
                    ring.newest().insert(*key, Cached::present(i as i32));
                    if i % 5 == 4 && rotations > 0 {
                        ring.rotate();
                    }
                }
                ring.clear_all();
                prop_assert!(ring.is_empty());
                for key in &keys {
                    prop_assert!(ring.lookup(key).is_none());
                }
            }
        }
    }
}
