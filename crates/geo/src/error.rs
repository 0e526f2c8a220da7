use thiserror::Error;

pub type Result<T> = std::result::Result<T, GeoError>;

/// Failure of a position request, mirroring the platform geolocation codes
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeolocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Position unavailable: {0}")]
    PositionUnavailable(String),

    #[error("Timed out waiting for position")]
    Timeout,
}

impl GeolocationError {
    /// Platform error code: 1 = denied, 2 = unavailable, 3 = timeout.
    pub const fn code(&self) -> u8 {
        match self {
            Self::PermissionDenied => 1,
            Self::PositionUnavailable(_) => 2,
            Self::Timeout => 3,
        }
    }

    /// Message shown inline next to the location fields.
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::PermissionDenied => {
                "Location permission denied. Please enter your location manually."
            }
            Self::PositionUnavailable(_) => {
                "Location information is unavailable. Please enter your location manually."
            }
            Self::Timeout => "Location request timed out. Please enter your location manually.",
        }
    }
}

#[derive(Error, Debug)]
pub enum GeoError {
    #[error(transparent)]
    Geolocation(#[from] GeolocationError),

    #[error("Invalid coordinates: latitude={latitude}, longitude={longitude}")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} error: {message}")]
    Provider { provider: String, message: String },

    #[error("{provider} does not support {operation}")]
    Unsupported {
        provider: String,
        operation: &'static str,
    },

    /// No provider produced a usable address
    #[error("Unable to determine location from coordinates")]
    NoProvider,

    #[error("Gazetteer error: {0}")]
    Gazetteer(#[from] bloodbridge_gazetteer::GazetteerError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{0}")]
    Other(String),
}

impl GeoError {
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Text for the inline location message of the form.
    pub fn user_message(&self) -> String {
        match self {
            Self::Geolocation(err) => err.user_message().to_string(),
            Self::NoProvider => self.to_string(),
            _ => "Unable to fetch location. Please enter your location manually.".to_string(),
        }
    }
}
