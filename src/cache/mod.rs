pub mod entry;
pub mod stats;

pub use entry::CacheEntry;
pub use stats::{HitRate, Resource};
