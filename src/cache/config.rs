//! Query cache configuration.

use std::num::NonZeroUsize;
use std::time::Duration;

const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(30);
const DEFAULT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryCacheConfig {
    /// When false every read goes to the sources; in-flight sharing still applies.
    pub enabled: bool,
    /// Age after which a cached entry is refetched on the next read.
    pub stale_after: Duration,
    /// Maximum number of cached queries.
    pub capacity: usize,
}

impl Default for QueryCacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            stale_after: DEFAULT_STALE_AFTER,
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl From<&crate::config::QuerySettings> for QueryCacheConfig {
    fn from(settings: &crate::config::QuerySettings) -> Self {
        Self {
            enabled: settings.enabled,
            stale_after: Duration::from_secs(settings.stale_after_seconds),
            capacity: settings.capacity,
        }
    }
}

impl QueryCacheConfig {
    /// Capacity as `NonZeroUsize`, clamping zero to one.
    pub fn capacity_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.capacity).unwrap_or(NonZeroUsize::MIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = QueryCacheConfig::default();
        assert!(config.enabled);
        assert_eq!(config.stale_after, Duration::from_secs(30));
        assert_eq!(config.capacity, 64);
    }

    #[test]
    fn non_zero_clamps_to_min() {
        let config = QueryCacheConfig {
            capacity: 0,
            ..Default::default()
        };
        assert_eq!(config.capacity_non_zero().get(), 1);
    }
}
