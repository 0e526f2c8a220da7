//! # Bloodbridge Profile
//!
//! Donor profile completion: field validation, the two-step wizard and the
//! client for the backend profile endpoints.
//!
//! ## Example
//!
//! ```rust
//! use bloodbridge_gazetteer::Gazetteer;
//! use bloodbridge_profile::{BloodGroup, Gender, ProfileWizard, Step, SubmitMode};
//! use chrono::NaiveDate;
//!
//! let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
//! let mut wizard = ProfileWizard::new(Gazetteer::india().unwrap(), SubmitMode::Complete);
//! wizard.set_gender(Gender::Male).unwrap();
//! wizard.set_phone("9876543210").unwrap();
//! wizard.set_dob(NaiveDate::from_ymd_opt(1990, 1, 31).unwrap()).unwrap();
//! wizard.set_blood_type(BloodGroup::BPositive).unwrap();
//! wizard.next(today).unwrap();
//!
//! wizard.select_state("Kerala").unwrap();
//! wizard.select_district("Ernakulam").unwrap();
//! wizard.set_city("Kochi").unwrap();
//!
//! let payload = wizard.begin_submit(today).unwrap();
//! assert_eq!(wizard.step(), Step::Submitting);
//! assert_eq!(payload.blood_type.as_str(), "B+");
//! ```

mod client;
mod config;
mod error;
mod payload;
mod session;
mod types;
pub mod validation;
mod wizard;

pub use client::{ProfileClient, SubmitMode};
pub use config::ApiConfig;
pub use error::{ProfileError, Result, ValidationError};
pub use payload::ProfilePayload;
pub use session::{FileSession, MemorySession, SessionStore};
pub use types::{BloodGroup, Gender};
pub use validation::{Field, FieldErrors};
pub use wizard::{
    LocationFields, PersonalDetails, ProfileFormHost, ProfileWizard, Step,
    UNMATCHED_LOCATION_MESSAGE,
};
