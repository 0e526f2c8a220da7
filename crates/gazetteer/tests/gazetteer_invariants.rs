use std::collections::HashSet;

use bloodbridge_gazetteer::{Gazetteer, MatchOutcome, Matcher, RawAddress};
use proptest::prelude::*;

fn india() -> &'static Gazetteer {
    Gazetteer::india().expect("builtin gazetteer")
}

#[test]
fn every_state_has_unique_non_empty_districts() {
    for state in india().states() {
        let districts = india().districts(state).expect("listed state resolves");
        assert!(!districts.is_empty(), "{state} has no districts");

        let unique: HashSet<_> = districts.iter().map(|d| d.to_lowercase()).collect();
        assert_eq!(unique.len(), districts.len(), "{state} has duplicates");
    }
}

#[test]
fn state_names_are_unique() {
    let names: Vec<_> = india().states().collect();
    let unique: HashSet<_> = names.iter().collect();
    assert_eq!(unique.len(), names.len());
}

#[test]
fn every_exact_pair_matches_itself() {
    let matcher = Matcher::new(india());
    for entry in india().entries() {
        for district in &entry.districts {
            let raw = RawAddress::new(Some(entry.name.as_str()), Some(district.as_str()), None);
            let result = matcher.match_address(&raw);
            assert_eq!(
                result.state,
                MatchOutcome::Exact {
                    value: entry.name.clone()
                }
            );
            assert_eq!(
                result.district,
                MatchOutcome::Exact {
                    value: district.clone()
                },
                "{} / {district}",
                entry.name
            );
        }
    }
}

#[test]
fn mumbai_without_district_resolves_to_mumbai_city() {
    let matcher = Matcher::new(india());
    let result = matcher.match_address(&RawAddress::new(Some("Maharashtra"), None, Some("Mumbai")));
    assert_eq!(result.state(), Some("Maharashtra"));
    assert_eq!(result.district(), Some("Mumbai City"));
}

#[test]
fn ernakulam_district_suffix_resolves() {
    let matcher = Matcher::new(india());
    let result = matcher.match_address(&RawAddress::new(
        Some("Kerala"),
        Some("Ernakulam District"),
        Some("Kochi"),
    ));
    assert_eq!(result.state(), Some("Kerala"));
    assert_eq!(result.district(), Some("Ernakulam"));
}

proptest! {
    #[test]
    fn matched_district_always_belongs_to_matched_state(
        state in "[A-Za-z &]{0,24}",
        district in "[A-Za-z ]{0,24}",
        city in "[A-Za-z ]{0,16}",
    ) {
        let matcher = Matcher::new(india());
        let raw = RawAddress::new(Some(state.as_str()), Some(district.as_str()), Some(city.as_str()));
        let result = matcher.match_address(&raw);

        if let Some(d) = result.district() {
            let s = result.state().expect("district implies state");
            prop_assert!(india().contains_district(s, d));
        }
        if let Some(s) = result.state() {
            prop_assert!(india().contains_state(s));
        }
    }

    #[test]
    fn fuzzy_scores_stay_in_unit_interval(district in "[a-z]{3,12}") {
        let matcher = Matcher::new(india());
        if let MatchOutcome::Fuzzy { score, .. } =
            matcher.match_district("Uttar Pradesh", Some(district.as_str()), None)
        {
            prop_assert!(score > 0.0 && score <= 1.0);
        }
    }
}
