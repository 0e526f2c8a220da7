use bloodbridge_gazetteer::{Gazetteer, LocationMatch, Matcher, RawAddress};
use serde::Serialize;

use crate::acquirer::{GeolocationAcquirer, PositionSource};
use crate::chain::GeocoderChain;
use crate::error::Result;
use crate::types::Coordinates;

/// Everything learned from one "use my location" request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationFix {
    pub coordinates: Coordinates,
    pub raw: RawAddress,
    pub matched: LocationMatch,
}

/// Flattened view of a fix, ready to drop into the location form.
///
/// `district` is `None` when only the state could be matched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedLocation {
    pub state: String,
    pub district: Option<String>,
    pub city: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

impl LocationFix {
    /// `None` when not even the state matched the gazetteer.
    pub fn resolved(&self) -> Option<ResolvedLocation> {
        let state = self.matched.state()?;
        Some(ResolvedLocation {
            state: state.to_string(),
            district: self.matched.district().map(str::to_string),
            city: self.matched.city.clone(),
            latitude: self.coordinates.latitude,
            longitude: self.coordinates.longitude,
        })
    }
}

/// Position, then reverse geocode, then gazetteer match.
pub struct LocationResolver<S> {
    acquirer: GeolocationAcquirer<S>,
    chain: GeocoderChain,
    gazetteer: &'static Gazetteer,
    similarity_threshold: f64,
}

impl<S: PositionSource> LocationResolver<S> {
    pub fn new(
        acquirer: GeolocationAcquirer<S>,
        chain: GeocoderChain,
        gazetteer: &'static Gazetteer,
        similarity_threshold: f64,
    ) -> Self {
        Self {
            acquirer,
            chain,
            gazetteer,
            similarity_threshold,
        }
    }

    pub async fn resolve(&self) -> Result<LocationFix> {
        let coordinates = self.acquirer.acquire().await?;
        self.resolve_at(coordinates).await
    }

    /// Skip acquisition and resolve a known position.
    pub async fn resolve_at(&self, coordinates: Coordinates) -> Result<LocationFix> {
        let raw = self.chain.reverse(coordinates).await?;
        let matched = Matcher::new(self.gazetteer)
            .with_similarity_threshold(self.similarity_threshold)
            .match_address(&raw);

        if !matched.is_complete() {
            log::info!("Partial location match for {raw:?}: {matched:?}");
        }
        Ok(LocationFix {
            coordinates,
            raw,
            matched,
        })
    }
}
