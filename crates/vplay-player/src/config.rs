//! Pipeline configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default maximum number of cached playable resources.
pub const MAX_CACHE_ENTRIES: usize = 10;
/// Default time-to-live for a cached resource (30 minutes).
pub const CACHE_TTL_SECS: u64 = 30 * 60;
/// Default bound on the direct-load metadata wait.
pub const PROBE_TIMEOUT_SECS: u64 = 3;

/// Tunables for a playback pipeline instance.
///
/// The canonical encoding parameters are deliberately not here: they are
/// fixed constants so cache entries stay interchangeable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Maximum number of cache entries before capacity eviction
    #[serde(default = "default_max_cache_entries")]
    pub max_cache_entries: usize,

    /// Cache entry time-to-live, in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Direct-load probe timeout, in seconds
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
}

fn default_max_cache_entries() -> usize {
    MAX_CACHE_ENTRIES
}
fn default_cache_ttl_secs() -> u64 {
    CACHE_TTL_SECS
}
fn default_probe_timeout_secs() -> u64 {
    PROBE_TIMEOUT_SECS
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            max_cache_entries: MAX_CACHE_ENTRIES,
            cache_ttl_secs: CACHE_TTL_SECS,
            probe_timeout_secs: PROBE_TIMEOUT_SECS,
        }
    }
}

impl PlayerConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache TTL as a duration.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PlayerConfig::default();
        assert_eq!(config.max_cache_entries, 10);
        assert_eq!(config.cache_ttl_secs, 1800);
        assert_eq!(config.probe_timeout_secs, 3);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let config: PlayerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.max_cache_entries, MAX_CACHE_ENTRIES);

        let config: PlayerConfig =
            serde_json::from_str(r#"{ "cache_ttl_secs": 60 }"#).unwrap();
        assert_eq!(config.cache_ttl_secs, 60);
        assert_eq!(config.probe_timeout_secs, PROBE_TIMEOUT_SECS);
    }
}
