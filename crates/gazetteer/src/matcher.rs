use serde::{Deserialize, Serialize};

use crate::gazetteer::Gazetteer;
use crate::normalize::{normalize, normalize_district};

/// Minimum normalized similarity for an edit-distance match.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.8;

/// The contained side of a substring match must be at least this long,
/// otherwise two-letter fragments would match half the table.
const MIN_CONTAINED_CHARS: usize = 3;

/// Address fields as returned by a geocoding provider. Free text, unvalidated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAddress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

impl RawAddress {
    pub fn new(state: Option<&str>, district: Option<&str>, city: Option<&str>) -> Self {
        let own = |v: Option<&str>| v.map(str::trim).filter(|s| !s.is_empty()).map(String::from);
        Self {
            state: own(state),
            district: own(district),
            city: own(city),
        }
    }

    /// True when no field carries any text.
    pub fn is_empty(&self) -> bool {
        self.state.is_none() && self.district.is_none() && self.city.is_none()
    }
}

/// How a single field was resolved against the gazetteer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchOutcome {
    /// Normalized text equals a gazetteer entry
    Exact { value: String },
    /// Resolved through an alias table
    Alias { value: String },
    /// Substring or edit-distance match; `score` is in (0, 1]
    Fuzzy { value: String, score: f64 },
    NoMatch,
}

impl MatchOutcome {
    pub fn value(&self) -> Option<&str> {
        match self {
            Self::Exact { value } | Self::Alias { value } | Self::Fuzzy { value, .. } => {
                Some(value)
            }
            Self::NoMatch => None,
        }
    }

    pub fn is_match(&self) -> bool {
        !matches!(self, Self::NoMatch)
    }
}

/// Result of matching a [`RawAddress`]. `district` is only ever a
/// district of the matched `state`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationMatch {
    pub state: MatchOutcome,
    pub district: MatchOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

impl LocationMatch {
    pub fn state(&self) -> Option<&str> {
        self.state.value()
    }

    pub fn district(&self) -> Option<&str> {
        self.district.value()
    }

    /// Both state and district resolved.
    pub fn is_complete(&self) -> bool {
        self.state.is_match() && self.district.is_match()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Rule {
    Exact,
    Contains,
    EditDistance,
}

/// Resolves raw address text to gazetteer entries.
///
/// Rules are tried in order and the first rule that yields any candidate
/// decides: exact equality, then bidirectional substring containment,
/// then bounded edit distance. Within a rule the highest score wins. A tied
/// district is settled by the city alias table when it has an entry,
/// otherwise by display order.
#[derive(Debug, Clone, Copy)]
pub struct Matcher<'g> {
    gazetteer: &'g Gazetteer,
    similarity_threshold: f64,
}

impl<'g> Matcher<'g> {
    pub fn new(gazetteer: &'g Gazetteer) -> Self {
        Self {
            gazetteer,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }

    #[must_use]
    pub fn with_similarity_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn match_address(&self, raw: &RawAddress) -> LocationMatch {
        let city = raw.city.clone();
        let Some((state_idx, state)) = raw.state.as_deref().and_then(|s| self.resolve_state(s))
        else {
            log::debug!("No state match for {:?}", raw.state);
            return LocationMatch {
                state: MatchOutcome::NoMatch,
                district: MatchOutcome::NoMatch,
                city,
            };
        };

        let district = self.resolve_district(state_idx, raw.district.as_deref(), raw.city.as_deref());
        log::debug!("Matched {raw:?} -> state={state:?} district={district:?}");
        LocationMatch {
            state,
            district,
            city,
        }
    }

    pub fn match_state(&self, raw_state: &str) -> MatchOutcome {
        self.resolve_state(raw_state)
            .map(|(_, outcome)| outcome)
            .unwrap_or(MatchOutcome::NoMatch)
    }

    /// Match a district within an exact state key. Unknown states never match.
    pub fn match_district(
        &self,
        state: &str,
        raw_district: Option<&str>,
        raw_city: Option<&str>,
    ) -> MatchOutcome {
        match self.gazetteer.state_index(state) {
            Some(idx) => self.resolve_district(idx, raw_district, raw_city),
            None => MatchOutcome::NoMatch,
        }
    }

    fn resolve_state(&self, raw_state: &str) -> Option<(usize, MatchOutcome)> {
        let needle = normalize(raw_state);
        if needle.is_empty() {
            return None;
        }

        let entries = self.gazetteer.entries();
        let candidates = entries.iter().map(|e| e.normalized.as_str());

        // Historic names resolve through the alias table before any fuzzy rule runs.
        if let Some(idx) = entries.iter().position(|e| e.normalized == needle) {
            return Some((idx, MatchOutcome::Exact { value: entries[idx].name.clone() }));
        }
        if let Some(idx) = self.gazetteer.state_alias_index(&needle) {
            return Some((idx, MatchOutcome::Alias { value: entries[idx].name.clone() }));
        }

        let best = best_candidate(&needle, candidates, self.similarity_threshold)?;
        Some((best.idx, outcome(best.rule, &entries[best.idx].name, best.score)))
    }

    fn resolve_district(
        &self,
        state_idx: usize,
        raw_district: Option<&str>,
        raw_city: Option<&str>,
    ) -> MatchOutcome {
        let entry = self.gazetteer.entry(state_idx);
        let alias = || {
            raw_city
                .and_then(|city| self.gazetteer.city_alias_at(state_idx, city))
                .or_else(|| raw_district.and_then(|d| self.gazetteer.city_alias_at(state_idx, d)))
                .map(|district| MatchOutcome::Alias {
                    value: district.to_string(),
                })
        };

        if let Some(raw) = raw_district {
            let needle = normalize_district(raw);
            if !needle.is_empty() {
                let candidates = entry.normalized_districts.iter().map(String::as_str);
                if let Some(best) = best_candidate(&needle, candidates, self.similarity_threshold) {
                    // "Kanpur" sits equally inside Kanpur Dehat and Kanpur Nagar.
                    if best.tied {
                        if let Some(alias) = alias() {
                            log::debug!("Ambiguous district {raw:?} settled by alias");
                            return alias;
                        }
                    }
                    return outcome(best.rule, &entry.districts[best.idx], best.score);
                }
            }
        }

        alias().unwrap_or(MatchOutcome::NoMatch)
    }
}

fn outcome(rule: Rule, value: &str, score: f64) -> MatchOutcome {
    let value = value.to_string();
    match rule {
        Rule::Exact => MatchOutcome::Exact { value },
        Rule::Contains | Rule::EditDistance => MatchOutcome::Fuzzy { value, score },
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    idx: usize,
    rule: Rule,
    score: f64,
    /// Another candidate reached the same score under the same rule.
    tied: bool,
}

fn best_candidate<'a>(
    needle: &str,
    candidates: impl Iterator<Item = &'a str> + Clone,
    threshold: f64,
) -> Option<Candidate> {
    if let Some(idx) = candidates.clone().position(|c| c == needle) {
        return Some(Candidate {
            idx,
            rule: Rule::Exact,
            score: 1.0,
            tied: false,
        });
    }

    let contains = pick_best(candidates.clone(), |c| containment_score(needle, c));
    if let Some((idx, score, tied)) = contains {
        return Some(Candidate {
            idx,
            rule: Rule::Contains,
            score,
            tied,
        });
    }

    pick_best(candidates, |c| {
        let similarity = strsim::normalized_levenshtein(needle, c);
        (similarity >= threshold).then_some(similarity)
    })
    .map(|(idx, score, tied)| Candidate {
        idx,
        rule: Rule::EditDistance,
        score,
        tied,
    })
}

/// Highest score wins; ties keep the earlier candidate and are flagged.
fn pick_best<'a>(
    candidates: impl Iterator<Item = &'a str>,
    mut score: impl FnMut(&str) -> Option<f64>,
) -> Option<(usize, f64, bool)> {
    let mut best: Option<(usize, f64, bool)> = None;
    for (idx, candidate) in candidates.enumerate() {
        let Some(s) = score(candidate) else {
            continue;
        };
        match best {
            Some((_, current, _)) if s < current => {}
            Some((first, current, _)) if s == current => best = Some((first, current, true)),
            _ => best = Some((idx, s, false)),
        }
    }
    best
}

/// Length ratio of the shorter to the longer string when one contains the other.
fn containment_score(a: &str, b: &str) -> Option<f64> {
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let short_chars = short.chars().count();
    if short_chars < MIN_CONTAINED_CHARS || !long.contains(short) {
        return None;
    }
    Some(short_chars as f64 / long.chars().count() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn india() -> &'static Gazetteer {
        Gazetteer::india().unwrap()
    }

    fn raw(state: Option<&str>, district: Option<&str>, city: Option<&str>) -> RawAddress {
        RawAddress::new(state, district, city)
    }

    #[test]
    fn exact_pair_is_returned_unchanged() {
        let matcher = Matcher::new(india());
        let result = matcher.match_address(&raw(Some("Kerala"), Some("Ernakulam"), None));
        assert_eq!(
            result.state,
            MatchOutcome::Exact {
                value: "Kerala".into()
            }
        );
        assert_eq!(
            result.district,
            MatchOutcome::Exact {
                value: "Ernakulam".into()
            }
        );
    }

    #[test]
    fn district_suffix_is_stripped_before_matching() {
        let matcher = Matcher::new(india());
        let result =
            matcher.match_address(&raw(Some("Kerala"), Some("Ernakulam District"), Some("Kochi")));
        assert_eq!(result.state(), Some("Kerala"));
        assert_eq!(result.district(), Some("Ernakulam"));
        assert!(result.is_complete());
    }

    #[test]
    fn city_alias_fills_missing_district() {
        let matcher = Matcher::new(india());
        let result = matcher.match_address(&raw(Some("Maharashtra"), None, Some("Mumbai")));
        assert_eq!(
            result.district,
            MatchOutcome::Alias {
                value: "Mumbai City".into()
            }
        );
    }

    #[test]
    fn containment_prefers_the_closest_length() {
        let matcher = Matcher::new(india());
        // "mumbai" is contained in both Mumbai City and Mumbai Suburban
        let outcome = matcher.match_district("Maharashtra", Some("Mumbai"), None);
        assert_eq!(outcome.value(), Some("Mumbai City"));
        assert!(matches!(outcome, MatchOutcome::Fuzzy { score, .. } if score < 1.0));
    }

    #[test]
    fn state_containment_handles_long_official_names() {
        let matcher = Matcher::new(india());
        assert_eq!(
            matcher.match_state("Government of Tamil Nadu").value(),
            Some("Tamil Nadu")
        );
    }

    #[test]
    fn ampersand_state_names_match_exactly() {
        let matcher = Matcher::new(india());
        assert_eq!(
            matcher.match_state("Jammu & Kashmir"),
            MatchOutcome::Exact {
                value: "Jammu and Kashmir".into()
            }
        );
    }

    #[test]
    fn state_alias_beats_fuzzy() {
        let matcher = Matcher::new(india());
        assert_eq!(
            matcher.match_state("Orissa"),
            MatchOutcome::Alias {
                value: "Odisha".into()
            }
        );
    }

    #[test]
    fn edit_distance_catches_small_misspellings() {
        let matcher = Matcher::new(india());
        let outcome = matcher.match_district("Kerala", Some("Thiruvananthapuam"), None);
        assert_eq!(outcome.value(), Some("Thiruvananthapuram"));
        assert!(matches!(outcome, MatchOutcome::Fuzzy { .. }));
    }

    #[test]
    fn unrelated_district_is_no_match() {
        let matcher = Matcher::new(india());
        let result = matcher.match_address(&raw(Some("Kerala"), Some("Springfield"), Some("Nowhere")));
        assert_eq!(result.state(), Some("Kerala"));
        assert_eq!(result.district, MatchOutcome::NoMatch);
        assert!(!result.is_complete());
    }

    #[test]
    fn unknown_state_leaves_both_fields_empty() {
        let matcher = Matcher::new(india());
        let result = matcher.match_address(&raw(Some("Bavaria"), Some("Ernakulam"), None));
        assert_eq!(result.state, MatchOutcome::NoMatch);
        assert_eq!(result.district, MatchOutcome::NoMatch);
    }

    #[test]
    fn short_fragments_do_not_contain_match() {
        let matcher = Matcher::new(india());
        assert_eq!(matcher.match_district("Kerala", Some("Ko"), None), MatchOutcome::NoMatch);
        assert_eq!(matcher.match_state("Pr"), MatchOutcome::NoMatch);
    }

    #[test]
    fn noise_only_district_falls_back_to_city_alias() {
        let matcher = Matcher::new(india());
        let outcome = matcher.match_district("Karnataka", Some("District"), Some("Bangalore"));
        assert_eq!(
            outcome,
            MatchOutcome::Alias {
                value: "Bengaluru Urban".into()
            }
        );
    }

    #[test]
    fn district_never_leaves_its_state() {
        let matcher = Matcher::new(india());
        // Ernakulam exists, but not in Tamil Nadu
        let outcome = matcher.match_district("Tamil Nadu", Some("Ernakulam"), None);
        assert_eq!(outcome, MatchOutcome::NoMatch);
    }

    #[test]
    fn tied_containment_defers_to_city_alias() {
        let matcher = Matcher::new(india());
        assert_eq!(
            matcher.match_district("Uttar Pradesh", Some("Kanpur"), None),
            MatchOutcome::Alias {
                value: "Kanpur Nagar".into()
            }
        );
        assert_eq!(
            matcher.match_district("Karnataka", Some("Bengaluru"), None),
            MatchOutcome::Alias {
                value: "Bengaluru Urban".into()
            }
        );
    }

    #[test]
    fn ties_keep_display_order_and_are_flagged() {
        assert_eq!(
            pick_best(["dehat", "nagar"].into_iter(), |_| Some(0.5)),
            Some((0, 0.5, true))
        );
        assert_eq!(
            pick_best(["ab", "abc"].into_iter(), |c| Some(c.len() as f64)),
            Some((1, 3.0, false))
        );
    }

    #[test]
    fn tighter_threshold_disables_edit_distance() {
        let matcher = Matcher::new(india()).with_similarity_threshold(1.0);
        let outcome = matcher.match_district("Kerala", Some("Thiruvananthapuam"), None);
        assert_eq!(outcome, MatchOutcome::NoMatch);
    }
}
