use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{BloodGroup, Gender};

/// JSON body of a profile completion or update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfilePayload {
    pub blood_type: BloodGroup,
    pub gender: Gender,
    pub phone: String,
    /// Serialized as `YYYY-MM-DD`
    pub dob: NaiveDate,
    pub state: String,
    pub district: String,
    pub city: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}
