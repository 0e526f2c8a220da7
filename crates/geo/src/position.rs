use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::acquirer::PositionSource;
use crate::error::{GeolocationError, Result};
use crate::providers::http_client;
use crate::types::{Accuracy, Coordinates, PositionOptions};

/// Fixed coordinates supplied by the caller
#[derive(Debug, Clone, Copy)]
pub struct StaticPosition(pub Coordinates);

#[async_trait]
impl PositionSource for StaticPosition {
    async fn current_position(
        &self,
        _options: PositionOptions,
    ) -> std::result::Result<Coordinates, GeolocationError> {
        Ok(self.0)
    }
}

/// Coarse position from an IP geolocation service.
///
/// It can never satisfy a high-accuracy request, so the acquirer's
/// low-accuracy fallback is the attempt that actually goes out.
pub struct IpPositionSource {
    client: Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
    #[serde(default)]
    error: Option<bool>,
    #[serde(default)]
    reason: Option<String>,
}

impl IpPositionSource {
    pub fn new(url: impl Into<String>, user_agent: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(user_agent, timeout)?,
            url: url.into(),
        })
    }

    async fn lookup(&self) -> std::result::Result<Coordinates, String> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| format!("IP lookup request failed: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("IP lookup failed with status {status}"));
        }

        let body: IpLookupResponse = response
            .json()
            .await
            .map_err(|e| format!("Failed to parse IP lookup response: {e}"))?;
        if body.error.unwrap_or(false) {
            return Err(body.reason.unwrap_or_else(|| "IP lookup error".to_string()));
        }

        match (body.latitude, body.longitude) {
            (Some(lat), Some(lon)) => Coordinates::new(lat, lon).map_err(|e| e.to_string()),
            _ => Err("IP lookup returned no coordinates".to_string()),
        }
    }
}

#[async_trait]
impl PositionSource for IpPositionSource {
    async fn current_position(
        &self,
        options: PositionOptions,
    ) -> std::result::Result<Coordinates, GeolocationError> {
        if options.accuracy == Accuracy::High {
            return Err(GeolocationError::PositionUnavailable(
                "IP geolocation cannot provide high accuracy".to_string(),
            ));
        }
        self.lookup()
            .await
            .map_err(GeolocationError::PositionUnavailable)
    }
}
