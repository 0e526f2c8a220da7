use thiserror::Error;

use crate::validation::FieldErrors;

pub type Result<T> = std::result::Result<T, ProfileError>;

/// A single field rule that failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),

    #[error("Phone number must be exactly 10 digits")]
    Phone,

    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Date of birth cannot be in the future")]
    FutureDate,

    #[error("Donors must be between 18 and 65 years old")]
    AgeOutOfRange,

    #[error("Unknown gender '{0}'")]
    UnknownGender(String),

    #[error("Unknown blood group '{0}'")]
    UnknownBloodGroup(String),

    #[error("Unknown state '{0}'")]
    UnknownState(String),

    #[error("'{district}' is not a district of {state}")]
    DistrictNotInState { state: String, district: String },

    #[error("Select a state first")]
    NoStateSelected,
}

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error(transparent)]
    Field(#[from] ValidationError),

    #[error("Cannot {action} while {step}")]
    InvalidStep { action: &'static str, step: String },

    /// Non-2xx answer; `message` is the server's text, verbatim
    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("{0}")]
    Unauthorized(String),

    #[error("Not signed in: no session token available")]
    NoSession,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{0}")]
    Other(String),
}

impl ProfileError {
    pub fn invalid_step(action: &'static str, step: impl std::fmt::Display) -> Self {
        Self::InvalidStep {
            action,
            step: step.to_string(),
        }
    }

    /// Text for the global banner of the form.
    pub fn banner_message(&self) -> String {
        match self {
            Self::Server { message, .. } | Self::Unauthorized(message) => message.clone(),
            Self::Http(_) => "Unable to reach the server. Please try again.".to_string(),
            other => other.to_string(),
        }
    }
}
