//! Two-step profile completion wizard.
//!
//! ```text
//! PersonalDetails ──next()──> Location ──begin_submit()──> Submitting ──finish(Ok)──> Done
//!        ▲                       │  ▲                          │
//!        └───────back()──────────┘  └──────finish(Err)─────────┘
//!
//! cancel() from PersonalDetails or Location ──> Cancelled
//! ```
//!
//! The wizard owns no I/O. Hosts feed it location fixes, autofill answers
//! and submission results, and read back field errors and messages.

use std::fmt;

use bloodbridge_gazetteer::Gazetteer;
use bloodbridge_geo::{AutofillUpdate, GeoError, LocationFix};
use chrono::NaiveDate;
use serde::Serialize;

use crate::client::{ProfileClient, SubmitMode};
use crate::error::{ProfileError, Result, ValidationError};
use crate::payload::ProfilePayload;
use crate::types::{BloodGroup, Gender};
use crate::validation::{
    validate_all, validate_location, validate_personal, validate_phone, Field, FieldErrors,
};

/// Shown when a fix came back but not even the state matched.
pub const UNMATCHED_LOCATION_MESSAGE: &str =
    "Could not match your location to a known state. Please select it manually.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    PersonalDetails,
    Location,
    Submitting,
    Done,
    Cancelled,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PersonalDetails => "on personal details",
            Self::Location => "on location",
            Self::Submitting => "submitting",
            Self::Done => "done",
            Self::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Callbacks into whatever shows the form
pub trait ProfileFormHost {
    /// The backend confirmed the profile; re-fetch it.
    fn on_success(&mut self);

    /// The form is gone, after success or cancel.
    fn on_close(&mut self);
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PersonalDetails {
    pub gender: Option<Gender>,
    pub phone: String,
    pub dob: Option<NaiveDate>,
    pub blood_type: Option<BloodGroup>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LocationFields {
    pub state: String,
    pub district: String,
    pub city: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl LocationFields {
    /// Free-text query for forward geocoding, once all three fields are filled.
    pub fn query(&self, country: &str) -> Option<String> {
        let parts = [self.city.trim(), self.district.trim(), self.state.trim()];
        if parts.iter().any(|p| p.is_empty()) {
            return None;
        }
        Some(format!("{}, {}, {}, {country}", parts[0], parts[1], parts[2]))
    }

    fn clear_coordinates(&mut self) {
        self.latitude = None;
        self.longitude = None;
    }
}

pub struct ProfileWizard {
    gazetteer: &'static Gazetteer,
    mode: SubmitMode,
    country: String,
    step: Step,
    personal: PersonalDetails,
    location: LocationFields,
    errors: FieldErrors,
    location_message: Option<String>,
    banner: Option<String>,
}

impl ProfileWizard {
    pub fn new(gazetteer: &'static Gazetteer, mode: SubmitMode) -> Self {
        Self {
            gazetteer,
            mode,
            country: "India".to_string(),
            step: Step::PersonalDetails,
            personal: PersonalDetails::default(),
            location: LocationFields::default(),
            errors: FieldErrors::new(),
            location_message: None,
            banner: None,
        }
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = country.into();
        self
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn mode(&self) -> SubmitMode {
        self.mode
    }

    pub fn personal(&self) -> &PersonalDetails {
        &self.personal
    }

    pub fn location(&self) -> &LocationFields {
        &self.location
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Persistent inline message next to the location fields.
    pub fn location_message(&self) -> Option<&str> {
        self.location_message.as_deref()
    }

    /// Global banner, set by a failed submission.
    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    pub fn is_editable(&self) -> bool {
        matches!(self.step, Step::PersonalDetails | Step::Location)
    }

    // Personal details

    pub fn set_gender(&mut self, gender: Gender) -> Result<()> {
        self.ensure_editable("edit gender")?;
        self.personal.gender = Some(gender);
        self.errors.remove(Field::Gender);
        Ok(())
    }

    /// Stores the phone as typed; the check runs on `next()`.
    pub fn set_phone(&mut self, phone: &str) -> Result<()> {
        self.ensure_editable("edit phone")?;
        self.personal.phone = phone.to_string();
        if validate_phone(&self.personal.phone).is_ok() {
            self.errors.remove(Field::Phone);
        }
        Ok(())
    }

    pub fn set_dob(&mut self, dob: NaiveDate) -> Result<()> {
        self.ensure_editable("edit date of birth")?;
        self.personal.dob = Some(dob);
        self.errors.remove(Field::Dob);
        Ok(())
    }

    pub fn set_blood_type(&mut self, blood_type: BloodGroup) -> Result<()> {
        self.ensure_editable("edit blood group")?;
        self.personal.blood_type = Some(blood_type);
        self.errors.remove(Field::BloodType);
        Ok(())
    }

    // Location

    /// Choose a state, or clear it with an empty string.
    ///
    /// A different state empties district and coordinates.
    pub fn select_state(&mut self, state: &str) -> Result<()> {
        self.ensure_editable("select a state")?;
        let state = state.trim();
        if !state.is_empty() && !self.gazetteer.contains_state(state) {
            return Err(ValidationError::UnknownState(state.to_string()).into());
        }
        if state != self.location.state {
            self.location.state = state.to_string();
            self.location.district.clear();
            self.location.clear_coordinates();
            self.errors.remove(Field::District);
        }
        self.errors.remove(Field::State);
        Ok(())
    }

    /// Districts offered by the selector; empty while no state is chosen.
    pub fn district_options(&self) -> &[String] {
        self.gazetteer
            .districts(&self.location.state)
            .unwrap_or_default()
    }

    pub fn district_selector_enabled(&self) -> bool {
        !self.location.state.is_empty()
    }

    pub fn select_district(&mut self, district: &str) -> Result<()> {
        self.ensure_editable("select a district")?;
        if !self.district_selector_enabled() {
            return Err(ValidationError::NoStateSelected.into());
        }
        let district = district.trim();
        if !district.is_empty()
            && !self
                .gazetteer
                .contains_district(&self.location.state, district)
        {
            return Err(ValidationError::DistrictNotInState {
                state: self.location.state.clone(),
                district: district.to_string(),
            }
            .into());
        }
        if district != self.location.district {
            self.location.district = district.to_string();
            self.location.clear_coordinates();
        }
        self.errors.remove(Field::District);
        Ok(())
    }

    pub fn set_city(&mut self, city: &str) -> Result<()> {
        self.ensure_editable("edit city")?;
        let city = city.trim();
        if city != self.location.city {
            self.location.city = city.to_string();
            self.location.clear_coordinates();
        }
        self.errors.remove(Field::City);
        Ok(())
    }

    /// Query to hand to the coordinate autofill after every location edit.
    pub fn location_query(&self) -> Option<String> {
        self.location.query(&self.country)
    }

    /// Fill the location fields from a "use my location" result.
    ///
    /// Returns false, leaving the fields alone, when no state matched.
    pub fn apply_location_fix(&mut self, fix: &LocationFix) -> bool {
        if !self.is_editable() {
            return false;
        }
        let Some(resolved) = fix.resolved() else {
            log::info!("Location fix did not match any state: {:?}", fix.raw);
            self.location_message = Some(UNMATCHED_LOCATION_MESSAGE.to_string());
            return false;
        };

        self.location.state = resolved.state;
        self.location.district = resolved.district.unwrap_or_default();
        if let Some(city) = resolved.city {
            self.location.city = city;
        }
        self.location.latitude = Some(resolved.latitude);
        self.location.longitude = Some(resolved.longitude);
        self.location_message = None;
        for field in [Field::State, Field::District, Field::City] {
            self.errors.remove(field);
        }
        true
    }

    /// Record a failed "use my location"; fields stay as they were.
    pub fn apply_location_error(&mut self, err: &GeoError) {
        log::info!("Location lookup failed: {err}");
        self.location_message = Some(err.user_message());
    }

    /// Take forward-geocoded coordinates if they are for the current fields.
    pub fn apply_autofill(&mut self, update: &AutofillUpdate) -> bool {
        if !self.is_editable() || self.location_query().as_deref() != Some(update.query.as_str()) {
            log::debug!("Discarding stale autofill for '{}'", update.query);
            return false;
        }
        let Some(coordinates) = update.coordinates else {
            return false;
        };
        self.location.latitude = Some(coordinates.latitude);
        self.location.longitude = Some(coordinates.longitude);
        true
    }

    // Navigation

    /// Validate personal details and move on to location.
    pub fn next(&mut self, today: NaiveDate) -> Result<()> {
        if self.step != Step::PersonalDetails {
            return Err(ProfileError::invalid_step("go to location", self.step));
        }
        let errors = self.personal_errors(today);
        if !errors.is_empty() {
            self.errors = errors.clone();
            return Err(ProfileError::Validation(errors));
        }
        self.errors = FieldErrors::new();
        self.step = Step::Location;
        Ok(())
    }

    /// Back to personal details, keeping everything entered.
    pub fn back(&mut self) -> Result<()> {
        if self.step != Step::Location {
            return Err(ProfileError::invalid_step("go back", self.step));
        }
        self.step = Step::PersonalDetails;
        Ok(())
    }

    /// Validate everything and build the request body.
    pub fn begin_submit(&mut self, today: NaiveDate) -> Result<ProfilePayload> {
        if self.step != Step::Location {
            return Err(ProfileError::invalid_step("submit", self.step));
        }
        let errors = validate_all(
            self.personal_errors(today),
            validate_location(
                self.gazetteer,
                &self.location.state,
                &self.location.district,
                &self.location.city,
            ),
        );
        if !errors.is_empty() {
            self.errors = errors.clone();
            return Err(ProfileError::Validation(errors));
        }

        let (Some(gender), Some(dob), Some(blood_type)) = (
            self.personal.gender,
            self.personal.dob,
            self.personal.blood_type,
        ) else {
            return Err(ProfileError::Other("personal details incomplete".to_string()));
        };

        self.errors = FieldErrors::new();
        self.banner = None;
        self.step = Step::Submitting;
        Ok(ProfilePayload {
            blood_type,
            gender,
            phone: self.personal.phone.clone(),
            dob,
            state: self.location.state.clone(),
            district: self.location.district.clone(),
            city: self.location.city.clone(),
            latitude: self.location.latitude,
            longitude: self.location.longitude,
        })
    }

    /// Settle a submission started with `begin_submit`.
    pub fn finish<T>(
        &mut self,
        outcome: Result<T>,
        host: &mut dyn ProfileFormHost,
    ) -> Result<()> {
        if self.step != Step::Submitting {
            return Err(ProfileError::invalid_step("finish", self.step));
        }
        match outcome {
            Ok(_) => {
                self.step = Step::Done;
                host.on_success();
                host.on_close();
            }
            Err(err) => {
                log::warn!("Profile submission failed: {err}");
                self.banner = Some(err.banner_message());
                self.step = Step::Location;
            }
        }
        Ok(())
    }

    /// `begin_submit`, send, `finish`. Returns the step reached.
    pub async fn submit(
        &mut self,
        client: &ProfileClient,
        host: &mut dyn ProfileFormHost,
        today: NaiveDate,
    ) -> Result<Step> {
        let payload = self.begin_submit(today)?;
        let outcome = client.submit(self.mode, &payload).await;
        self.finish(outcome, host)?;
        Ok(self.step)
    }

    /// Close without submitting. Not possible mid-submission.
    pub fn cancel(&mut self, host: &mut dyn ProfileFormHost) -> bool {
        if !self.is_editable() {
            return false;
        }
        self.step = Step::Cancelled;
        host.on_close();
        true
    }

    fn personal_errors(&self, today: NaiveDate) -> FieldErrors {
        validate_personal(
            self.personal.gender,
            &self.personal.phone,
            self.personal.dob,
            self.personal.blood_type,
            today,
        )
    }

    fn ensure_editable(&self, action: &'static str) -> Result<()> {
        if self.is_editable() {
            Ok(())
        } else {
            Err(ProfileError::invalid_step(action, self.step))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bloodbridge_geo::{Coordinates, GeolocationError, RawAddress};
    use bloodbridge_gazetteer::Matcher;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct Host {
        successes: usize,
        closes: usize,
    }

    impl ProfileFormHost for Host {
        fn on_success(&mut self) {
            self.successes += 1;
        }

        fn on_close(&mut self) {
            self.closes += 1;
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn wizard() -> ProfileWizard {
        ProfileWizard::new(Gazetteer::india().unwrap(), SubmitMode::Complete)
    }

    fn with_personal_details() -> ProfileWizard {
        let mut wizard = wizard();
        wizard.set_gender(Gender::Female).unwrap();
        wizard.set_phone("9876543210").unwrap();
        wizard
            .set_dob(NaiveDate::from_ymd_opt(1995, 3, 1).unwrap())
            .unwrap();
        wizard.set_blood_type(BloodGroup::OPositive).unwrap();
        wizard.next(today()).unwrap();
        wizard
    }

    fn fix(raw: RawAddress) -> LocationFix {
        let matched = Matcher::new(Gazetteer::india().unwrap()).match_address(&raw);
        LocationFix {
            coordinates: Coordinates::new(9.9312, 76.2673).unwrap(),
            raw,
            matched,
        }
    }

    #[test]
    fn invalid_personal_details_block_progress() {
        let mut wizard = wizard();
        wizard.set_phone("12345abcde").unwrap();

        let err = wizard.next(today()).unwrap_err();
        assert!(matches!(err, ProfileError::Validation(_)));
        assert_eq!(wizard.step(), Step::PersonalDetails);
        assert_eq!(
            wizard.errors().get(Field::Phone),
            Some("Phone number must be exactly 10 digits")
        );
        assert_eq!(wizard.errors().len(), 4);
    }

    #[test]
    fn phone_is_checked_as_typed() {
        let mut wizard = with_personal_details();
        wizard.back().unwrap();
        wizard.set_phone(" 9876543210 ").unwrap();

        assert!(wizard.next(today()).is_err());
        assert_eq!(wizard.step(), Step::PersonalDetails);
        assert_eq!(
            wizard.errors().get(Field::Phone),
            Some("Phone number must be exactly 10 digits")
        );
        assert_eq!(wizard.mode(), SubmitMode::Complete);
    }

    #[test]
    fn back_keeps_entered_data() {
        let mut wizard = with_personal_details();
        wizard.select_state("Kerala").unwrap();
        wizard.back().unwrap();

        assert_eq!(wizard.step(), Step::PersonalDetails);
        assert_eq!(wizard.personal().phone, "9876543210");
        assert_eq!(wizard.location().state, "Kerala");
    }

    #[test]
    fn district_selector_follows_state() {
        let mut wizard = with_personal_details();
        assert!(!wizard.district_selector_enabled());
        assert!(wizard.district_options().is_empty());
        assert!(matches!(
            wizard.select_district("Ernakulam"),
            Err(ProfileError::Field(ValidationError::NoStateSelected))
        ));

        wizard.select_state("Kerala").unwrap();
        assert!(wizard.district_options().iter().any(|d| d == "Ernakulam"));
        wizard.select_district("Ernakulam").unwrap();
        assert!(wizard.select_district("Pune").is_err());

        // Re-selecting the same state keeps the district.
        wizard.select_state("Kerala").unwrap();
        assert_eq!(wizard.location().district, "Ernakulam");

        wizard.select_state("Maharashtra").unwrap();
        assert_eq!(wizard.location().district, "");

        wizard.select_state("").unwrap();
        assert!(wizard.district_options().is_empty());
    }

    #[test]
    fn unknown_state_is_rejected() {
        let mut wizard = with_personal_details();
        assert!(wizard.select_state("Atlantis").is_err());
        assert_eq!(wizard.location().state, "");
    }

    #[test]
    fn location_fix_fills_fields() {
        let mut wizard = with_personal_details();
        let applied = wizard.apply_location_fix(&fix(RawAddress::new(
            Some("Kerala"),
            Some("Ernakulam District"),
            Some("Kochi"),
        )));

        assert!(applied);
        assert_eq!(
            wizard.location(),
            &LocationFields {
                state: "Kerala".into(),
                district: "Ernakulam".into(),
                city: "Kochi".into(),
                latitude: Some(9.9312),
                longitude: Some(76.2673),
            }
        );
        assert_eq!(wizard.location_message(), None);
    }

    #[test]
    fn unmatched_fix_leaves_fields_empty() {
        let mut wizard = with_personal_details();
        let applied =
            wizard.apply_location_fix(&fix(RawAddress::new(Some("Bavaria"), None, Some("Munich"))));

        assert!(!applied);
        assert_eq!(wizard.location(), &LocationFields::default());
        assert_eq!(wizard.location_message(), Some(UNMATCHED_LOCATION_MESSAGE));
    }

    #[test]
    fn location_errors_become_inline_messages() {
        let mut wizard = with_personal_details();
        wizard.apply_location_error(&GeoError::NoProvider);
        assert_eq!(
            wizard.location_message(),
            Some("Unable to determine location from coordinates")
        );
        assert_eq!(wizard.location(), &LocationFields::default());

        wizard.apply_location_error(&GeolocationError::PermissionDenied.into());
        assert_eq!(
            wizard.location_message(),
            Some("Location permission denied. Please enter your location manually.")
        );
        assert_eq!(wizard.step(), Step::Location);
    }

    #[test]
    fn autofill_applies_only_to_the_current_query() {
        let mut wizard = with_personal_details();
        wizard.select_state("Kerala").unwrap();
        wizard.select_district("Ernakulam").unwrap();
        assert_eq!(wizard.location_query(), None);
        wizard.set_city("Kochi").unwrap();

        let query = wizard.location_query().unwrap();
        assert_eq!(query, "Kochi, Ernakulam, Kerala, India");

        let stale = AutofillUpdate {
            query: "Aluva, Ernakulam, Kerala, India".into(),
            coordinates: Some(Coordinates::new(10.1, 76.35).unwrap()),
        };
        assert!(!wizard.apply_autofill(&stale));

        let current = AutofillUpdate {
            query,
            coordinates: Some(Coordinates::new(9.98, 76.28).unwrap()),
        };
        assert!(wizard.apply_autofill(&current));
        assert_eq!(wizard.location().latitude, Some(9.98));

        // Editing the city drops coordinates that no longer describe it.
        wizard.set_city("Aluva").unwrap();
        assert_eq!(wizard.location().latitude, None);
    }

    #[test]
    fn submit_requires_complete_location() {
        let mut wizard = with_personal_details();
        wizard.select_state("Kerala").unwrap();

        let err = wizard.begin_submit(today()).unwrap_err();
        assert!(matches!(err, ProfileError::Validation(_)));
        assert_eq!(wizard.step(), Step::Location);
        assert!(wizard.errors().get(Field::District).is_some());
        assert!(wizard.errors().get(Field::City).is_some());
    }

    #[test]
    fn failed_submission_keeps_form_editable() {
        let mut wizard = with_personal_details();
        wizard.select_state("Kerala").unwrap();
        wizard.select_district("Ernakulam").unwrap();
        wizard.set_city("Kochi").unwrap();

        let payload = wizard.begin_submit(today()).unwrap();
        assert_eq!(payload.district, "Ernakulam");
        assert_eq!(wizard.step(), Step::Submitting);
        assert!(!wizard.cancel(&mut Host::default()));

        let mut host = Host::default();
        wizard
            .finish::<()>(
                Err(ProfileError::Server {
                    status: 400,
                    message: "Phone number already in use".into(),
                }),
                &mut host,
            )
            .unwrap();
        assert_eq!(wizard.step(), Step::Location);
        assert_eq!(wizard.banner(), Some("Phone number already in use"));
        assert_eq!(wizard.location().city, "Kochi");
        assert_eq!(host.successes, 0);

        wizard.begin_submit(today()).unwrap();
        assert_eq!(wizard.banner(), None);
        wizard.finish(Ok(()), &mut host).unwrap();
        assert_eq!(wizard.step(), Step::Done);
        assert_eq!((host.successes, host.closes), (1, 1));
        assert!(wizard.set_city("Aluva").is_err());
    }

    #[test]
    fn cancel_closes_the_form() {
        let mut wizard = wizard();
        let mut host = Host::default();
        assert!(wizard.cancel(&mut host));
        assert_eq!(wizard.step(), Step::Cancelled);
        assert_eq!(host.closes, 1);
        assert!(!wizard.cancel(&mut host));
    }
}
