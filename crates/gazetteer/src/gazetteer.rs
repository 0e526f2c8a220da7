use std::collections::{BTreeMap, HashMap, HashSet};

use once_cell::sync::OnceCell;
use serde::Deserialize;

use crate::error::{GazetteerError, Result};
use crate::normalize::{normalize, normalize_district};

const BUILTIN_INDIA: &str = include_str!("../data/india.json");

static INDIA: OnceCell<Gazetteer> = OnceCell::new();

/// One state and its districts in display order
#[derive(Debug, Clone)]
pub struct StateEntry {
    pub name: String,
    pub districts: Vec<String>,
    pub(crate) normalized: String,
    pub(crate) normalized_districts: Vec<String>,
}

/// Static state -> districts table with its alias tables.
///
/// Loaded once from an embedded JSON document and validated on load:
/// every state has at least one district, names are unique within their
/// scope and every alias resolves to an existing entry.
#[derive(Debug, Clone)]
pub struct Gazetteer {
    states: Vec<StateEntry>,
    state_aliases: HashMap<String, usize>,
    // keyed by (state index, normalized city)
    city_aliases: HashMap<(usize, String), usize>,
}

#[derive(Debug, Deserialize)]
struct RawGazetteer {
    schema_version: u32,
    states: Vec<RawState>,
    #[serde(default)]
    state_aliases: BTreeMap<String, String>,
    #[serde(default)]
    city_aliases: BTreeMap<String, BTreeMap<String, String>>,
}

#[derive(Debug, Deserialize)]
struct RawState {
    name: String,
    districts: Vec<String>,
}

impl Gazetteer {
    /// The built-in Indian gazetteer.
    pub fn india() -> Result<&'static Gazetteer> {
        INDIA.get_or_try_init(|| Self::from_json(BUILTIN_INDIA))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let raw: RawGazetteer = serde_json::from_str(raw)?;
        if raw.schema_version != 1 {
            return Err(GazetteerError::UnsupportedSchema(raw.schema_version));
        }

        let mut states = Vec::with_capacity(raw.states.len());
        let mut seen_states = HashSet::new();
        for state in raw.states {
            let normalized = normalize(&state.name);
            if !seen_states.insert(normalized.clone()) {
                return Err(GazetteerError::duplicate("states", state.name));
            }
            if state.districts.is_empty() {
                return Err(GazetteerError::EmptyState(state.name));
            }

            let mut seen = HashSet::new();
            let mut normalized_districts = Vec::with_capacity(state.districts.len());
            for district in &state.districts {
                let key = normalize_district(district);
                if key.is_empty() || !seen.insert(key.clone()) {
                    return Err(GazetteerError::duplicate(&state.name, district));
                }
                normalized_districts.push(key);
            }

            states.push(StateEntry {
                name: state.name,
                districts: state.districts,
                normalized,
                normalized_districts,
            });
        }

        let mut gazetteer = Self {
            states,
            state_aliases: HashMap::new(),
            city_aliases: HashMap::new(),
        };

        for (alias, target) in raw.state_aliases {
            let idx = gazetteer
                .state_index(&target)
                .ok_or_else(|| GazetteerError::dangling(&alias, &target))?;
            gazetteer.state_aliases.insert(normalize(&alias), idx);
        }

        for (state, cities) in raw.city_aliases {
            let state_idx = gazetteer
                .state_index(&state)
                .ok_or_else(|| GazetteerError::UnknownState(state.clone()))?;
            for (city, district) in cities {
                let district_idx = gazetteer.states[state_idx]
                    .districts
                    .iter()
                    .position(|d| d == &district)
                    .ok_or_else(|| GazetteerError::dangling(&city, &district))?;
                gazetteer
                    .city_aliases
                    .insert((state_idx, normalize(&city)), district_idx);
            }
        }

        log::debug!(
            "Loaded gazetteer: {} states, {} state aliases, {} city aliases",
            gazetteer.states.len(),
            gazetteer.state_aliases.len(),
            gazetteer.city_aliases.len()
        );
        Ok(gazetteer)
    }

    /// State names in display order.
    pub fn states(&self) -> impl Iterator<Item = &str> {
        self.states.iter().map(|s| s.name.as_str())
    }

    pub fn entries(&self) -> &[StateEntry] {
        &self.states
    }

    /// Districts of an exact state key, in display order.
    pub fn districts(&self, state: &str) -> Option<&[String]> {
        self.states
            .iter()
            .find(|s| s.name == state)
            .map(|s| s.districts.as_slice())
    }

    pub fn contains_state(&self, state: &str) -> bool {
        self.states.iter().any(|s| s.name == state)
    }

    pub fn contains_district(&self, state: &str, district: &str) -> bool {
        self.districts(state)
            .is_some_and(|list| list.iter().any(|d| d == district))
    }

    /// Canonical state for an alternate spelling ("Orissa" -> "Odisha").
    pub fn state_alias(&self, name: &str) -> Option<&str> {
        self.state_aliases
            .get(&normalize(name))
            .map(|&idx| self.states[idx].name.as_str())
    }

    /// District a city belongs to within `state`, from the alias table.
    pub fn city_alias(&self, state: &str, city: &str) -> Option<&str> {
        let state_idx = self.state_index(state)?;
        self.city_alias_at(state_idx, city)
    }

    pub(crate) fn entry(&self, idx: usize) -> &StateEntry {
        &self.states[idx]
    }

    pub(crate) fn state_index(&self, state: &str) -> Option<usize> {
        self.states.iter().position(|s| s.name == state)
    }

    pub(crate) fn state_alias_index(&self, normalized: &str) -> Option<usize> {
        self.state_aliases.get(normalized).copied()
    }

    pub(crate) fn city_alias_at(&self, state_idx: usize, city: &str) -> Option<&str> {
        let key = normalize(city);
        if key.is_empty() {
            return None;
        }
        self.city_aliases
            .get(&(state_idx, key))
            .map(|&d| self.states[state_idx].districts[d].as_str())
    }
}
