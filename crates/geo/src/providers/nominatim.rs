use std::time::Duration;

use async_trait::async_trait;
use bloodbridge_gazetteer::RawAddress;
use reqwest::Client;
use serde::Deserialize;

use super::{first_non_empty, get_json, http_client, ReverseGeocoder};
use crate::error::{GeoError, Result};
use crate::types::Coordinates;

const NAME: &str = "nominatim";

/// OpenStreetMap Nominatim, the primary provider
pub struct Nominatim {
    client: Client,
    base_url: String,
}

#[derive(Debug, Default, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    address: Option<Address>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Address {
    state: Option<String>,
    state_district: Option<String>,
    county: Option<String>,
    district: Option<String>,
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    suburb: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
}

impl Address {
    fn into_raw(self) -> RawAddress {
        RawAddress::new(
            first_non_empty([self.state.as_deref()]),
            first_non_empty([
                self.state_district.as_deref(),
                self.county.as_deref(),
                self.district.as_deref(),
            ]),
            first_non_empty([
                self.city.as_deref(),
                self.town.as_deref(),
                self.village.as_deref(),
                self.suburb.as_deref(),
            ]),
        )
    }
}

impl Nominatim {
    pub fn new(base_url: impl Into<String>, user_agent: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(user_agent, timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ReverseGeocoder for Nominatim {
    fn name(&self) -> &str {
        NAME
    }

    async fn reverse(&self, at: Coordinates) -> Result<RawAddress> {
        let request = self
            .client
            .get(format!("{}/reverse", self.base_url))
            .query(&[
                ("format", "json".to_string()),
                ("lat", at.latitude.to_string()),
                ("lon", at.longitude.to_string()),
                ("zoom", "10".to_string()),
                ("addressdetails", "1".to_string()),
            ]);
        let body: ReverseResponse = get_json(NAME, request).await?;

        if let Some(error) = body.error {
            return Err(GeoError::provider(NAME, error));
        }
        Ok(body.address.unwrap_or_default().into_raw())
    }

    async fn search(&self, query: &str) -> Result<Option<Coordinates>> {
        let request = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[("format", "json"), ("limit", "1"), ("q", query)]);
        let hits: Vec<SearchHit> = get_json(NAME, request).await?;

        let Some(hit) = hits.into_iter().next() else {
            return Ok(None);
        };
        let parse = |v: &str| {
            v.parse::<f64>()
                .map_err(|e| GeoError::provider(NAME, format!("bad coordinate '{v}': {e}")))
        };
        Coordinates::new(parse(&hit.lat)?, parse(&hit.lon)?).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(json: &str) -> RawAddress {
        let body: ReverseResponse = serde_json::from_str(json).unwrap();
        body.address.unwrap_or_default().into_raw()
    }

    #[test]
    fn state_district_wins_over_county() {
        let raw = parse(
            r#"{"address":{"state":"Kerala","state_district":"Ernakulam","county":"Kanayannur",
                "city":"Kochi","postcode":"682011","country_code":"in"}}"#,
        );
        assert_eq!(raw, RawAddress::new(Some("Kerala"), Some("Ernakulam"), Some("Kochi")));
    }

    #[test]
    fn falls_through_district_and_city_aliases() {
        let raw = parse(
            r#"{"address":{"state":"Maharashtra","county":"","district":"Pune District",
                "village":"Lonavala"}}"#,
        );
        assert_eq!(
            raw,
            RawAddress::new(Some("Maharashtra"), Some("Pune District"), Some("Lonavala"))
        );
    }

    #[test]
    fn missing_address_is_empty() {
        assert!(parse(r#"{"place_id": 1}"#).is_empty());
    }
}
