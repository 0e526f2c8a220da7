use std::time::Duration;

use async_trait::async_trait;
use bloodbridge_gazetteer::RawAddress;
use reqwest::Client;
use serde::Deserialize;

use super::{first_non_empty, get_json, http_client, ReverseGeocoder};
use crate::error::{GeoError, Result};
use crate::types::Coordinates;

const NAME: &str = "bigdatacloud";

/// Admin level BigDataCloud uses for Indian districts
const DISTRICT_ADMIN_LEVEL: u32 = 5;

/// BigDataCloud client-side reverse geocoding, the fallback provider
pub struct BigDataCloud {
    client: Client,
    base_url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReverseResponse {
    #[serde(default)]
    principal_subdivision: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    locality: Option<String>,
    #[serde(default)]
    locality_info: Option<LocalityInfo>,
}

#[derive(Debug, Default, Deserialize)]
struct LocalityInfo {
    #[serde(default)]
    administrative: Vec<AdminArea>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdminArea {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    admin_level: Option<u32>,
}

impl ReverseResponse {
    fn into_raw(self) -> RawAddress {
        let admin = self
            .locality_info
            .map(|info| info.administrative)
            .unwrap_or_default();

        let by_level = admin
            .iter()
            .find(|a| a.admin_level == Some(DISTRICT_ADMIN_LEVEL))
            .and_then(|a| a.name.as_deref());
        let by_name = admin
            .iter()
            .filter_map(|a| a.name.as_deref())
            .find(|name| name.to_lowercase().contains("district"));

        RawAddress::new(
            first_non_empty([self.principal_subdivision.as_deref()]),
            first_non_empty([by_level, by_name]),
            first_non_empty([self.city.as_deref(), self.locality.as_deref()]),
        )
    }
}

impl BigDataCloud {
    pub fn new(base_url: impl Into<String>, user_agent: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(user_agent, timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ReverseGeocoder for BigDataCloud {
    fn name(&self) -> &str {
        NAME
    }

    async fn reverse(&self, at: Coordinates) -> Result<RawAddress> {
        let request = self
            .client
            .get(format!("{}/data/reverse-geocode-client", self.base_url))
            .query(&[
                ("latitude", at.latitude.to_string()),
                ("longitude", at.longitude.to_string()),
                ("localityLanguage", "en".to_string()),
            ]);
        let body: ReverseResponse = get_json(NAME, request).await?;
        Ok(body.into_raw())
    }

    async fn search(&self, _query: &str) -> Result<Option<Coordinates>> {
        Err(GeoError::Unsupported {
            provider: NAME.to_string(),
            operation: "forward search",
        })
    }
}
