//! # Bloodbridge Gazetteer
//!
//! State/district reference data for India and the matcher that turns
//! free-text geocoder output into gazetteer entries.
//!
//! ## Matching
//!
//! ```text
//! RawAddress { state?, district?, city? }
//!     │
//!     ├──> State:    exact ─> state alias ─> containment ─> edit distance
//!     │
//!     └──> District (within the matched state only):
//!                    exact ─> containment ─> edit distance ─> city alias
//!
//! Each field comes back tagged: Exact | Alias | Fuzzy { score } | NoMatch
//! ```
//!
//! ## Example
//!
//! ```rust
//! use bloodbridge_gazetteer::{Gazetteer, Matcher, RawAddress};
//!
//! let gazetteer = Gazetteer::india().unwrap();
//! let raw = RawAddress::new(Some("Kerala"), Some("Ernakulam District"), Some("Kochi"));
//! let matched = Matcher::new(gazetteer).match_address(&raw);
//!
//! assert_eq!(matched.state(), Some("Kerala"));
//! assert_eq!(matched.district(), Some("Ernakulam"));
//! ```

mod error;
mod fuzzy;
mod gazetteer;
mod matcher;
mod normalize;

pub use error::{GazetteerError, Result};
pub use fuzzy::{DistrictSearch, DistrictSuggestion};
pub use gazetteer::{Gazetteer, StateEntry};
pub use matcher::{LocationMatch, MatchOutcome, Matcher, RawAddress, DEFAULT_SIMILARITY_THRESHOLD};
pub use normalize::{normalize, normalize_district};
