//! Single-value cache with a time-to-live.

use std::time::Duration;
use tokio::time::Instant;

/// Holds the last fetched value and when it was fetched.
/// The value is only handed out while it is younger than the TTL.
#[derive(Debug, Clone)]
pub struct TtlCache<T> {
    value: Option<T>,
    fetched_at: Option<Instant>,
    ttl: Duration,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            value: None,
            fetched_at: None,
            ttl,
        }
    }

    /// Fresh value, if any.
    pub fn get(&self) -> Option<T> {
        self.get_at(Instant::now())
    }

    /// Fresh value relative to `now`.
    fn get_at(&self, now: Instant) -> Option<T> {
        match (&self.value, self.fetched_at) {
            (Some(value), Some(at)) if now.saturating_duration_since(at) < self.ttl => {
                Some(value.clone())
            }
            _ => None,
        }
    }

    /// Overwrite with a freshly fetched value.
    pub fn store(&mut self, value: T) {
        self.value = Some(value);
        self.fetched_at = Some(Instant::now());
    }
}
