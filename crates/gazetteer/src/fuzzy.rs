use nucleo_matcher::pattern::{CaseMatching, Normalization, Pattern};
use nucleo_matcher::{Config, Matcher, Utf32String};
use serde::Serialize;

use crate::error::{GazetteerError, Result};
use crate::gazetteer::Gazetteer;

/// A district suggestion for the type-ahead picker
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistrictSuggestion {
    pub district: String,
    /// Normalized to 0-1 against the best hit of the query
    pub score: f32,
}

/// Type-ahead search over one state's districts using nucleo-matcher
pub struct DistrictSearch {
    matcher: Matcher,
}

impl DistrictSearch {
    pub fn new() -> Self {
        Self {
            matcher: Matcher::new(Config::DEFAULT),
        }
    }

    /// Rank the districts of `state` against `query`.
    ///
    /// An empty query returns the districts in display order, so the picker
    /// can show the full list before the user starts typing.
    pub fn search(
        &mut self,
        gazetteer: &Gazetteer,
        state: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<DistrictSuggestion>> {
        let districts = gazetteer
            .districts(state)
            .ok_or_else(|| GazetteerError::UnknownState(state.to_string()))?;

        if query.trim().is_empty() {
            return Ok(districts
                .iter()
                .take(limit)
                .map(|d| DistrictSuggestion {
                    district: d.clone(),
                    score: 1.0,
                })
                .collect());
        }

        let pattern = Pattern::parse(query, CaseMatching::Smart, Normalization::Smart);

        let mut scored: Vec<(usize, u32)> = districts
            .iter()
            .enumerate()
            .filter_map(|(idx, district)| {
                let haystack = Utf32String::from(district.as_str());
                pattern
                    .score(haystack.slice(..), &mut self.matcher)
                    .map(|score| (idx, score))
            })
            .collect();

        // Stable sort keeps display order among equal scores
        scored.sort_by(|a, b| b.1.cmp(&a.1));
        scored.truncate(limit);

        let max_score = scored.first().map(|(_, s)| *s as f32).unwrap_or(1.0);

        Ok(scored
            .into_iter()
            .map(|(idx, score)| DistrictSuggestion {
                district: districts[idx].clone(),
                score: if max_score > 0.0 {
                    score as f32 / max_score
                } else {
                    0.0
                },
            })
            .collect())
    }
}

impl Default for DistrictSearch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn india() -> &'static Gazetteer {
        Gazetteer::india().unwrap()
    }

    #[test]
    fn prefix_query_ranks_matching_district_first() {
        let mut search = DistrictSearch::new();
        let results = search.search(india(), "Kerala", "erna", 5).unwrap();
        assert!(!results.is_empty());
        assert_eq!(results[0].district, "Ernakulam");
        assert_eq!(results[0].score, 1.0);
    }

    #[test]
    fn typo_tolerant_subsequence() {
        let mut search = DistrictSearch::new();
        let results = search.search(india(), "Kerala", "tvm", 5).unwrap();
        assert!(results
            .iter()
            .any(|s| s.district == "Thiruvananthapuram"));
    }

    #[test]
    fn empty_query_lists_in_display_order() {
        let mut search = DistrictSearch::new();
        let results = search.search(india(), "Goa", "", 10).unwrap();
        let names: Vec<_> = results.iter().map(|s| s.district.as_str()).collect();
        assert_eq!(names, vec!["North Goa", "South Goa"]);
    }

    #[test]
    fn limit_is_respected() {
        let mut search = DistrictSearch::new();
        let results = search.search(india(), "Uttar Pradesh", "a", 3).unwrap();
        assert!(results.len() <= 3);
    }

    #[test]
    fn unknown_state_is_an_error() {
        let mut search = DistrictSearch::new();
        assert!(matches!(
            search.search(india(), "Atlantis", "x", 3),
            Err(GazetteerError::UnknownState(_))
        ));
    }
}
