use bloodbridge_geo::{GeoError, GeolocationError};
use bloodbridge_profile::{ProfileError, ValidationError};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Ok,
    Error,
}

#[derive(Debug, Serialize, Clone)]
pub struct ErrorEnvelope {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Debug, Serialize, Clone, Default)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

/// One JSON document per invocation, printed to stdout
#[derive(Debug, Serialize, Clone)]
pub struct Response {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorEnvelope>,
    pub data: Value,
    pub meta: ResponseMeta,
}

impl Response {
    pub fn ok(data: Value, message: Option<String>) -> Self {
        Self {
            status: Status::Ok,
            message,
            error: None,
            data,
            meta: ResponseMeta::default(),
        }
    }

    pub fn failure(code: &'static str, message: String, data: Value) -> Self {
        Self {
            status: Status::Error,
            message: Some(message.clone()),
            error: Some(ErrorEnvelope {
                code,
                message,
                details: None,
            }),
            data,
            meta: ResponseMeta::default(),
        }
    }

    pub fn from_error(err: &anyhow::Error) -> Self {
        let message = format!("{err:#}");
        let mut response = Self::failure(classify_error(err), message, Value::Null);
        if let Some(error) = response.error.as_mut() {
            error.details = error_details(err);
        }
        response
    }

    pub fn is_error(&self) -> bool {
        matches!(self.status, Status::Error)
    }
}

/// Stable machine-readable code for the outermost known error in the chain.
pub fn classify_error(err: &anyhow::Error) -> &'static str {
    for cause in err.chain() {
        if let Some(err) = cause.downcast_ref::<ProfileError>() {
            return match err {
                ProfileError::Validation(_) | ProfileError::Field(_) => "validation",
                ProfileError::Unauthorized(_) => "unauthorized",
                ProfileError::NoSession => "no_session",
                ProfileError::Server { .. } => "server",
                ProfileError::InvalidConfig(_) => "invalid_config",
                ProfileError::InvalidStep { .. } => "invalid_step",
                ProfileError::Http(_) => "network",
                _ => "internal",
            };
        }
        if cause.downcast_ref::<ValidationError>().is_some() {
            return "validation";
        }
        if let Some(err) = cause.downcast_ref::<GeoError>() {
            return match err {
                GeoError::Geolocation(GeolocationError::PermissionDenied) => "permission_denied",
                GeoError::Geolocation(_) => "position_unavailable",
                GeoError::InvalidCoordinates { .. } => "validation",
                GeoError::NoProvider => "location_unresolved",
                GeoError::InvalidConfig(_) => "invalid_config",
                _ => "geocoding",
            };
        }
    }
    "internal"
}

fn error_details(err: &anyhow::Error) -> Option<Value> {
    err.chain().find_map(|cause| match cause.downcast_ref::<ProfileError>() {
        Some(ProfileError::Validation(fields)) => serde_json::to_value(fields).ok(),
        Some(ProfileError::Server { status, .. }) => Some(serde_json::json!({ "status": status })),
        _ => None,
    })
}
