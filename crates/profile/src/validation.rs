//! Field rules for the profile form.
//!
//! Everything here is pure: dates are checked against a caller-supplied
//! `today` so the age boundaries can be tested exactly.

use std::collections::BTreeMap;
use std::fmt;

use bloodbridge_gazetteer::Gazetteer;
use chrono::{Months, NaiveDate};
use serde::Serialize;

use crate::error::ValidationError;

pub const MIN_DONOR_AGE_YEARS: u32 = 18;
pub const MAX_DONOR_AGE_YEARS: u32 = 65;
pub const PHONE_DIGITS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Gender,
    Phone,
    Dob,
    BloodType,
    State,
    District,
    City,
}

impl Field {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Gender => "Gender",
            Self::Phone => "Phone number",
            Self::Dob => "Date of birth",
            Self::BloodType => "Blood group",
            Self::State => "State",
            Self::District => "District",
            Self::City => "City",
        }
    }
}

/// Per-field messages shown inline; empty means the step is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<Field, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: Field, error: &ValidationError) {
        self.0.insert(field, error.to_string());
    }

    pub fn remove(&mut self, field: Field) {
        self.0.remove(&field);
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(f, m)| (*f, m.as_str()))
    }

    fn check(&mut self, field: Field, result: Result<(), ValidationError>) {
        if let Err(err) = result {
            self.insert(field, &err);
        }
    }

    /// Add every error of `other`, replacing messages for shared fields.
    pub fn extend(&mut self, other: FieldErrors) {
        self.0.extend(other.0);
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {message}", field.label())?;
            first = false;
        }
        Ok(())
    }
}

/// Exactly ten ASCII digits, nothing else.
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if phone.is_empty() {
        return Err(ValidationError::Required(Field::Phone.label()));
    }
    if phone.len() != PHONE_DIGITS || !phone.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::Phone);
    }
    Ok(())
}

pub fn parse_dob(raw: &str) -> Result<NaiveDate, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::Required(Field::Dob.label()));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidDate(raw.to_string()))
}

/// Age must fall in [18, 65] by calendar arithmetic.
///
/// A donor is 18 from the day `today - 18 years` onward and too old from the
/// day after `today - 65 years`. A Feb 29 birthday turns over on Mar 1 in
/// common years.
pub fn validate_dob(dob: NaiveDate, today: NaiveDate) -> Result<(), ValidationError> {
    if dob > today {
        return Err(ValidationError::FutureDate);
    }
    let youngest = years_before(today, MIN_DONOR_AGE_YEARS);
    let oldest = years_before(today, MAX_DONOR_AGE_YEARS);
    match (youngest, oldest) {
        (Some(youngest), Some(oldest)) if dob <= youngest && dob >= oldest => Ok(()),
        _ => Err(ValidationError::AgeOutOfRange),
    }
}

/// Whole years completed between `dob` and `today`.
pub fn age_on(dob: NaiveDate, today: NaiveDate) -> Option<u32> {
    (0..=200u32)
        .take_while(|&years| years_before(today, years).is_some_and(|d| dob <= d))
        .last()
}

fn years_before(date: NaiveDate, years: u32) -> Option<NaiveDate> {
    date.checked_sub_months(Months::new(years * 12))
}

/// Location fields: all required, the state must be a gazetteer key and
/// the district one of its districts.
pub fn validate_location(
    gazetteer: &Gazetteer,
    state: &str,
    district: &str,
    city: &str,
) -> FieldErrors {
    let mut errors = FieldErrors::new();
    let state = state.trim();
    let district = district.trim();

    if state.is_empty() {
        errors.insert(Field::State, &ValidationError::Required(Field::State.label()));
    } else if !gazetteer.contains_state(state) {
        errors.insert(Field::State, &ValidationError::UnknownState(state.to_string()));
    }

    if district.is_empty() {
        errors.insert(
            Field::District,
            &ValidationError::Required(Field::District.label()),
        );
    } else if gazetteer.contains_state(state) && !gazetteer.contains_district(state, district) {
        errors.insert(
            Field::District,
            &ValidationError::DistrictNotInState {
                state: state.to_string(),
                district: district.to_string(),
            },
        );
    }

    if city.trim().is_empty() {
        errors.insert(Field::City, &ValidationError::Required(Field::City.label()));
    }
    errors
}

/// Personal details as entered; `None` means not chosen yet.
pub fn validate_personal(
    gender: Option<crate::Gender>,
    phone: &str,
    dob: Option<NaiveDate>,
    blood_type: Option<crate::BloodGroup>,
    today: NaiveDate,
) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if gender.is_none() {
        errors.insert(Field::Gender, &ValidationError::Required(Field::Gender.label()));
    }
    errors.check(Field::Phone, validate_phone(phone));
    match dob {
        Some(dob) => errors.check(Field::Dob, validate_dob(dob, today)),
        None => errors.insert(Field::Dob, &ValidationError::Required(Field::Dob.label())),
    }
    if blood_type.is_none() {
        errors.insert(
            Field::BloodType,
            &ValidationError::Required(Field::BloodType.label()),
        );
    }
    errors
}

/// Both steps at once, as checked right before submission.
pub(crate) fn validate_all(personal: FieldErrors, location: FieldErrors) -> FieldErrors {
    let mut errors = personal;
    errors.extend(location);
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BloodGroup, Gender};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn phone_rules() {
        assert!(validate_phone("1234567890").is_ok());
        assert_eq!(validate_phone("123456789"), Err(ValidationError::Phone));
        assert_eq!(validate_phone("12345abcde"), Err(ValidationError::Phone));
        assert_eq!(validate_phone("12345678901"), Err(ValidationError::Phone));
        assert_eq!(validate_phone(" 1234567890 "), Err(ValidationError::Phone));
        assert!(matches!(validate_phone(""), Err(ValidationError::Required(_))));
        // Non-ASCII digits are not phone digits.
        assert_eq!(validate_phone("١٢٣٤٥٦٧٨٩٠"), Err(ValidationError::Phone));
    }

    #[test]
    fn age_boundaries() {
        let today = date(2024, 6, 15);

        // 18 years 0 days
        assert!(validate_dob(date(2006, 6, 15), today).is_ok());
        // 17 years 364 days
        assert_eq!(
            validate_dob(date(2006, 6, 16), today),
            Err(ValidationError::AgeOutOfRange)
        );
        // 65 years 0 days
        assert!(validate_dob(date(1959, 6, 15), today).is_ok());
        // 65 years 1 day
        assert_eq!(
            validate_dob(date(1959, 6, 14), today),
            Err(ValidationError::AgeOutOfRange)
        );
    }

    #[test]
    fn leap_day_birthdays_turn_over_on_mar_1() {
        let dob = date(2004, 2, 29);
        assert!(validate_dob(dob, date(2022, 2, 28)).is_err());
        assert!(validate_dob(dob, date(2022, 3, 1)).is_ok());
        assert_eq!(age_on(dob, date(2022, 2, 28)), Some(17));
        assert_eq!(age_on(dob, date(2022, 3, 1)), Some(18));
    }

    #[test]
    fn future_dates_are_rejected() {
        assert_eq!(
            validate_dob(date(2030, 1, 1), date(2024, 6, 15)),
            Err(ValidationError::FutureDate)
        );
    }

    #[test]
    fn dob_parsing() {
        assert_eq!(parse_dob(" 1990-01-31 ").unwrap(), date(1990, 1, 31));
        assert_eq!(
            parse_dob("31/01/1990"),
            Err(ValidationError::InvalidDate("31/01/1990".into()))
        );
        assert!(matches!(parse_dob(""), Err(ValidationError::Required(_))));
    }

    #[test]
    fn personal_details_report_every_missing_field() {
        let errors = validate_personal(None, "", None, None, date(2024, 6, 15));
        assert_eq!(errors.len(), 4);

        let ok = validate_personal(
            Some(Gender::Female),
            "9876543210",
            Some(date(1995, 3, 1)),
            Some(BloodGroup::ONegative),
            date(2024, 6, 15),
        );
        assert!(ok.is_empty());
    }

    #[test]
    fn location_requires_a_district_of_the_state() {
        let gazetteer = Gazetteer::india().unwrap();
        assert!(validate_location(gazetteer, "Kerala", "Ernakulam", "Kochi").is_empty());

        let errors = validate_location(gazetteer, "Kerala", "Pune", "Kochi");
        assert_eq!(
            errors.get(Field::District),
            Some("'Pune' is not a district of Kerala")
        );

        let errors = validate_location(gazetteer, "", "", " ");
        assert_eq!(errors.len(), 3);
        assert_eq!(errors.get(Field::City), Some("City is required"));
    }

    proptest! {
        #[test]
        fn age_on_agrees_with_validate_dob(days_old in 0i64..(80 * 366)) {
            let today = date(2024, 6, 15);
            let dob = today - chrono::Duration::days(days_old);
            let age = age_on(dob, today).unwrap();
            let in_range = (MIN_DONOR_AGE_YEARS..MAX_DONOR_AGE_YEARS).contains(&age)
                || (age == MAX_DONOR_AGE_YEARS && years_before(today, age) == Some(dob));
            prop_assert_eq!(validate_dob(dob, today).is_ok(), in_range);
        }
    }
}
