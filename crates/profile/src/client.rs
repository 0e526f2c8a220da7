use std::sync::Arc;

use reqwest::{Client, Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ApiConfig;
use crate::error::{ProfileError, Result};
use crate::payload::ProfilePayload;
use crate::session::SessionStore;

/// Which endpoint a submission goes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitMode {
    /// First completion after sign-up: POST
    Complete,
    /// Editing an existing profile: PUT
    Update,
}

/// Thin client for the donor profile endpoints
#[derive(Clone)]
pub struct ProfileClient {
    client: Client,
    config: ApiConfig,
    session: Arc<dyn SessionStore>,
}

impl ProfileClient {
    pub fn new(
        config: ApiConfig,
        session: Arc<dyn SessionStore>,
        user_agent: &str,
    ) -> Result<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            config,
            session,
        })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub async fn submit(&self, mode: SubmitMode, payload: &ProfilePayload) -> Result<Value> {
        match mode {
            SubmitMode::Complete => self.complete_profile(payload).await,
            SubmitMode::Update => self.update_profile(payload).await,
        }
    }

    pub async fn complete_profile(&self, payload: &ProfilePayload) -> Result<Value> {
        self.send(Method::POST, &self.config.complete_profile_path, Some(payload))
            .await
    }

    pub async fn update_profile(&self, payload: &ProfilePayload) -> Result<Value> {
        self.send(Method::PUT, &self.config.update_profile_path, Some(payload))
            .await
    }

    /// Canonical profile as stored by the backend.
    pub async fn fetch_profile(&self) -> Result<Value> {
        self.send::<()>(Method::GET, &self.config.profile_path, None)
            .await
    }

    async fn send<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Value> {
        let token = self.session.read_token()?.ok_or(ProfileError::NoSession)?;
        let url = self.config.url(path);
        log::debug!("{method} {url}");

        let mut request = self.client.request(method.clone(), &url).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            if text.trim().is_empty() {
                return Ok(Value::Null);
            }
            return Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)));
        }

        let message = server_message(status, &text);
        log::warn!("{method} {url} failed with {status}: {message}");
        if status == StatusCode::UNAUTHORIZED {
            self.session.clear()?;
            return Err(ProfileError::Unauthorized(message));
        }
        Err(ProfileError::Server {
            status: status.as_u16(),
            message,
        })
    }
}

/// Error text of a non-2xx answer: JSON `message`, then `error`, then the raw body.
fn server_message(status: StatusCode, body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: Option<String>,
        error: Option<String>,
    }

    let body = body.trim();
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(text) = parsed
            .message
            .or(parsed.error)
            .filter(|t| !t.trim().is_empty())
        {
            return text;
        }
    }
    if !body.is_empty() {
        return body.to_string();
    }
    status
        .canonical_reason()
        .map_or_else(|| format!("Request failed with status {status}"), str::to_string)
}
