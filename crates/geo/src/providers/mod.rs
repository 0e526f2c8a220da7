//! Geocoding providers.
//!
//! Every provider answers in its own JSON shape; each adapter folds that
//! shape into [`RawAddress`] by taking the first non-empty field among the
//! provider's aliases for state, district and city.

mod bigdatacloud;
mod nominatim;

use std::time::Duration;

use async_trait::async_trait;
use bloodbridge_gazetteer::RawAddress;
use reqwest::Client;

use crate::error::{GeoError, Result};
use crate::types::Coordinates;

pub use bigdatacloud::BigDataCloud;
pub use nominatim::Nominatim;

/// A reverse (and optionally forward) geocoding service
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    fn name(&self) -> &str;

    /// Address fields for a position.
    async fn reverse(&self, at: Coordinates) -> Result<RawAddress>;

    /// Position for a free-text query. `Ok(None)` when nothing matched.
    async fn search(&self, query: &str) -> Result<Option<Coordinates>>;
}

/// First candidate with non-whitespace text.
pub(crate) fn first_non_empty<'a>(
    candidates: impl IntoIterator<Item = Option<&'a str>>,
) -> Option<&'a str> {
    candidates
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
}

pub(crate) fn http_client(user_agent: &str, timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()
        .map_err(GeoError::Http)
}

/// Send a GET and decode JSON, turning non-2xx into a provider error.
pub(crate) async fn get_json<T: serde::de::DeserializeOwned>(
    provider: &str,
    request: reqwest::RequestBuilder,
) -> Result<T> {
    let response = request
        .send()
        .await
        .map_err(|e| GeoError::provider(provider, format!("request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(GeoError::provider(
            provider,
            format!("request failed with status {status}"),
        ));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| GeoError::provider(provider, format!("failed to parse response: {e}")))
}
