use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{GeoError, Result};

/// Configuration for position acquisition and geocoding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoConfig {
    /// Timeout for each position attempt (high accuracy, then low accuracy)
    pub geolocation_timeout_secs: u64,

    /// Per-request timeout for geocoding HTTP calls
    pub http_timeout_secs: u64,

    /// Quiet period before manual location fields are forward-geocoded
    pub debounce_ms: u64,

    /// Primary provider (OpenStreetMap Nominatim) base URL
    pub nominatim_url: String,

    /// Secondary provider (BigDataCloud) base URL
    pub bigdatacloud_url: String,

    /// IP geolocation endpoint used when no device position is available
    pub ip_lookup_url: String,

    /// Nominatim's usage policy requires an identifying User-Agent
    pub user_agent: String,

    /// Country appended to forward-geocoding queries
    pub country: String,

    /// Minimum normalized similarity for edit-distance matches
    pub similarity_threshold: f64,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            geolocation_timeout_secs: 20,
            http_timeout_secs: 10,
            debounce_ms: 1_500,
            nominatim_url: "https://nominatim.openstreetmap.org".to_string(),
            bigdatacloud_url: "https://api.bigdatacloud.net".to_string(),
            ip_lookup_url: "https://ipapi.co/json/".to_string(),
            user_agent: concat!("bloodbridge/", env!("CARGO_PKG_VERSION")).to_string(),
            country: "India".to_string(),
            similarity_threshold: bloodbridge_gazetteer::DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

impl GeoConfig {
    pub const fn geolocation_timeout(&self) -> Duration {
        Duration::from_secs(self.geolocation_timeout_secs)
    }

    pub const fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.geolocation_timeout_secs == 0 {
            return Err(GeoError::InvalidConfig(
                "geolocation_timeout_secs must be > 0".to_string(),
            ));
        }
        if self.http_timeout_secs == 0 {
            return Err(GeoError::InvalidConfig(
                "http_timeout_secs must be > 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(GeoError::InvalidConfig(format!(
                "similarity_threshold ({}) must be within 0.0..=1.0",
                self.similarity_threshold
            )));
        }
        for (name, url) in [
            ("nominatim_url", &self.nominatim_url),
            ("bigdatacloud_url", &self.bigdatacloud_url),
            ("ip_lookup_url", &self.ip_lookup_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(GeoError::InvalidConfig(format!(
                    "{name} must be an http(s) URL, got '{url}'"
                )));
            }
        }
        if self.user_agent.trim().is_empty() {
            return Err(GeoError::InvalidConfig(
                "user_agent must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
