//! Stop cache configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Precision 6 yields cells of approximately 1.22km x 0.61km.
pub const DEFAULT_GEOHASH_PRECISION: usize = 6;
pub const DEFAULT_EXPIRATION_MINUTES: u64 = 60;

/// Embeddable in host app settings; missing fields take their defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StopCacheConfig {
    /// Precision every active geohash must have (checked in debug builds).
    pub precision: usize,
    /// Entries at least this old are refetched before being served.
    pub expiration_minutes: u64,
    /// Share a single fetch between concurrent misses for the same cell.
    pub coalesce_in_flight: bool,
}

impl StopCacheConfig {
    /// Saturates, so very large settings mean entries effectively never expire.
    pub fn expiration(&self) -> Duration {
        Duration::from_secs(self.expiration_minutes.saturating_mul(60))
    }
}

impl Default for StopCacheConfig {
    fn default() -> Self {
        Self {
            precision: DEFAULT_GEOHASH_PRECISION,
            expiration_minutes: DEFAULT_EXPIRATION_MINUTES,
            coalesce_in_flight: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StopCacheConfig::default();

        assert_eq!(config.precision, 6);
        assert_eq!(config.expiration(), Duration::from_secs(3600));
        assert!(config.coalesce_in_flight);
    }

    #[test]
    fn test_partial_settings_fill_defaults() {
        let config: StopCacheConfig =
            serde_json::from_str(r#"{ "expiration_minutes": 5 }"#).unwrap();

        assert_eq!(config.expiration(), Duration::from_secs(300));
        assert_eq!(config.precision, DEFAULT_GEOHASH_PRECISION);
        assert!(config.coalesce_in_flight);
    }

    #[test]
    fn test_huge_expiration_saturates() {
        let config: StopCacheConfig =
            serde_json::from_str(r#"{ "expiration_minutes": 18446744073709551615 }"#).unwrap();

        assert_eq!(config.expiration_minutes, u64::MAX);
        assert_eq!(config.expiration(), Duration::from_secs(u64::MAX));
    }
}
