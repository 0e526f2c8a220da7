//! Text normalization shared by every comparison in the matcher.
//!
//! Geocoding providers hand back free text: mixed case, stray punctuation,
//! "&" for "and", and administrative suffixes like "District" or "Dt.".
//! Both sides of a comparison go through the same function so that only
//! the spelling of the place name itself is compared.

/// Words dropped from district strings before comparison.
const DISTRICT_NOISE: &[&str] = &["district", "dist", "dt"];

/// Lowercase, turn `&` into `and`, replace punctuation with spaces and
/// collapse runs of whitespace.
pub fn normalize(input: &str) -> String {
    let mut spaced = String::with_capacity(input.len());
    for ch in input.chars() {
        if ch == '&' {
            spaced.push_str(" and ");
        } else if ch.is_alphanumeric() {
            spaced.extend(ch.to_lowercase());
        } else {
            spaced.push(' ');
        }
    }
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// [`normalize`] plus removal of the "district"/"dist"/"dt" words.
pub fn normalize_district(input: &str) -> String {
    normalize(input)
        .split(' ')
        .filter(|word| !word.is_empty() && !DISTRICT_NOISE.contains(word))
        .collect::<Vec<_>>()
        .join(" ")
}
