pub use crate::cache::{CacheOptions, GenCache};
pub use crate::ds::{Bucket, Cached, GenerationRing, RotationReport};
pub use crate::error::{ConfigError, ResolverError};
pub use crate::metrics::CacheMetrics;
pub use crate::resolver::{from_pairs, Resolved, Resolver};
