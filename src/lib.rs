//! gencache: generational ring cache with batched resolve and negative caching.
//!
//! Expiry is governed by a ring of generation buckets rotated on a fixed
//! period rather than per-entry TTL timers: an entry stays resident for at
//! least one period and at most `bucket_count` periods. Misses are resolved
//! through a caller-supplied batch resolver; `None` results become negative
//! cache entries with the same lifetime as positive ones.
//!
//! See `DESIGN.md` for internal architecture and invariants.

pub mod ds;

pub mod cache;
pub mod error;
pub mod metrics;
pub mod prelude;
pub mod resolver;

mod driver;
