use chrono::{DateTime, Duration, Utc};

/// A cached value and the moment it was fetched.
///
/// A stale entry is kept; it is only no longer served without a refetch.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    pub data: T,
    pub fetch_time: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    pub fn new(data: T, fetch_time: DateTime<Utc>) -> Self {
        Self { data, fetch_time }
    }

    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.fetch_time < ttl
    }
}
