//! # Bloodbridge Geo
//!
//! Turns "where is the donor" into gazetteer entries.
//!
//! ## Pipeline
//!
//! ```text
//! PositionSource ──> GeolocationAcquirer (high accuracy, then one low-accuracy retry)
//!                          │
//!                          ▼
//!                    GeocoderChain (Nominatim ─> BigDataCloud, in order)
//!                          │  RawAddress
//!                          ▼
//!                    Matcher (bloodbridge-gazetteer)
//!                          │
//!                          ▼
//!                    LocationFix { coordinates, raw, matched }
//! ```
//!
//! Manually typed locations go the other way: [`CoordinateAutofill`]
//! debounces field edits and forward-geocodes the settled query.

mod acquirer;
mod chain;
mod config;
mod debounce;
mod error;
mod position;
mod providers;
mod resolver;
mod types;

pub use acquirer::{GeolocationAcquirer, PositionSource};
pub use bloodbridge_gazetteer::RawAddress;
pub use chain::GeocoderChain;
pub use config::GeoConfig;
pub use debounce::{AutofillUpdate, CoordinateAutofill, Debouncer};
pub use error::{GeoError, GeolocationError, Result};
pub use position::{IpPositionSource, StaticPosition};
pub use providers::{BigDataCloud, Nominatim, ReverseGeocoder};
pub use resolver::{LocationFix, LocationResolver, ResolvedLocation};
pub use types::{Accuracy, Coordinates, PositionOptions};
