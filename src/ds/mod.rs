pub mod bucket;
pub mod ring;

pub use bucket::{Bucket, Cached};
pub use ring::{GenerationRing, RotationReport};
