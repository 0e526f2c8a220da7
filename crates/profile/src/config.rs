use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ProfileError, Result};

/// Backend endpoints used by the profile client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the REST backend, without a trailing slash
    pub base_url: String,

    /// First completion, POST
    pub complete_profile_path: String,

    /// Later edits, PUT
    pub update_profile_path: String,

    /// Canonical profile, GET
    pub profile_path: String,

    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            complete_profile_path: "/api/auth/complete-profile".to_string(),
            update_profile_path: "/api/donor/update-profile".to_string(),
            profile_path: "/api/donor/profile".to_string(),
            timeout_secs: 10,
        }
    }
}

impl ApiConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ProfileError::InvalidConfig(format!(
                "base_url must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        for (name, path) in [
            ("complete_profile_path", &self.complete_profile_path),
            ("update_profile_path", &self.update_profile_path),
            ("profile_path", &self.profile_path),
        ] {
            if !path.starts_with('/') {
                return Err(ProfileError::InvalidConfig(format!(
                    "{name} must start with '/', got '{path}'"
                )));
            }
        }
        if self.timeout_secs == 0 {
            return Err(ProfileError::InvalidConfig(
                "timeout_secs must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}
