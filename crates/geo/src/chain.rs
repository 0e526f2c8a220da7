use std::sync::Arc;

use bloodbridge_gazetteer::RawAddress;

use crate::config::GeoConfig;
use crate::error::{GeoError, Result};
use crate::providers::{BigDataCloud, Nominatim, ReverseGeocoder};
use crate::types::Coordinates;

/// Providers tried strictly in order, never raced.
#[derive(Clone)]
pub struct GeocoderChain {
    providers: Vec<Arc<dyn ReverseGeocoder>>,
}

impl GeocoderChain {
    pub fn new(providers: Vec<Arc<dyn ReverseGeocoder>>) -> Self {
        Self { providers }
    }

    /// Nominatim first, BigDataCloud as the fallback.
    pub fn from_config(config: &GeoConfig) -> Result<Self> {
        let timeout = config.http_timeout();
        let primary: Arc<dyn ReverseGeocoder> = Arc::new(Nominatim::new(
            &config.nominatim_url,
            &config.user_agent,
            timeout,
        )?);
        let fallback: Arc<dyn ReverseGeocoder> = Arc::new(BigDataCloud::new(
            &config.bigdatacloud_url,
            &config.user_agent,
            timeout,
        )?);
        Ok(Self::new(vec![primary, fallback]))
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// First provider answer that names a state.
    ///
    /// Errors and answers without a state are logged and skipped.
    pub async fn reverse(&self, at: Coordinates) -> Result<RawAddress> {
        for provider in &self.providers {
            match provider.reverse(at).await {
                Ok(address) if address.state.is_some() => {
                    log::debug!("{} resolved {at:?} -> {address:?}", provider.name());
                    return Ok(address);
                }
                Ok(address) => {
                    log::warn!(
                        "{} returned no usable address for {at:?}: {address:?}",
                        provider.name()
                    );
                }
                Err(err) => {
                    log::warn!("{} reverse geocoding failed: {err}", provider.name());
                }
            }
        }
        Err(GeoError::NoProvider)
    }

    /// Forward-geocode a free-text query. `Ok(None)` when no provider found it.
    pub async fn search(&self, query: &str) -> Result<Option<Coordinates>> {
        for provider in &self.providers {
            match provider.search(query).await {
                Ok(Some(position)) => return Ok(Some(position)),
                Ok(None) => log::debug!("{} found nothing for '{query}'", provider.name()),
                Err(err @ GeoError::Unsupported { .. }) => log::debug!("{err}"),
                Err(err) => log::warn!("{} forward geocoding failed: {err}", provider.name()),
            }
        }
        Ok(None)
    }
}
