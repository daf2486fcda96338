//! HTTP adapter for the identity backend.
//!
//! `POST {base}/auth/login` with `{email, password}`; success is the envelope
//! `{success: true, data: {user, organization?}}`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use dashgate_auth::{BackendError, BackendLogin, IdentityBackend};
use dashgate_core::EmailAddress;

const USER_AGENT: &str = concat!("dashgate/", env!("CARGO_PKG_VERSION"));
const LOGIN_PATH: &str = "auth/login";

#[derive(Debug, Error)]
pub enum HttpBackendError {
    #[error("invalid identity backend url: {0}")]
    InvalidBaseUrl(String),

    #[error(transparent)]
    Client(#[from] reqwest::Error),
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

#[derive(Clone)]
pub struct HttpIdentityBackend {
    client: Client,
    login_url: Url,
}

impl HttpIdentityBackend {
    /// `timeout` bounds the whole request, connect included.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, HttpBackendError> {
        let mut base =
            Url::parse(base_url).map_err(|e| HttpBackendError::InvalidBaseUrl(e.to_string()))?;
        if base.cannot_be_a_base() || !matches!(base.scheme(), "http" | "https") {
            return Err(HttpBackendError::InvalidBaseUrl(format!(
                "{base_url} is not an http(s) base url"
            )));
        }
        // `Url::join` replaces the last segment unless the path ends in '/'.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let login_url = base
            .join(LOGIN_PATH)
            .map_err(|e| HttpBackendError::InvalidBaseUrl(e.to_string()))?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self { client, login_url })
    }

    pub fn login_url(&self) -> &Url {
        &self.login_url
    }
}

#[async_trait]
impl IdentityBackend for HttpIdentityBackend {
    async fn login(
        &self,
        email: &EmailAddress,
        password: &SecretString,
    ) -> Result<BackendLogin, BackendError> {
        let response = self
            .client
            .post(self.login_url.clone())
            .json(&LoginRequest {
                email: email.as_str(),
                password: password.expose_secret(),
            })
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(timeout = e.is_timeout(), connect = e.is_connect(), "identity backend request failed");
                BackendError::Unreachable(e.without_url().to_string())
            })?;

        let status = response.status();
        if matches!(
            status,
            StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT
        ) {
            return Err(BackendError::Unreachable(format!("status {status}")));
        }
        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "identity backend rejected login");
            return Err(BackendError::Rejected {
                status: Some(status.as_u16()),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| BackendError::Unreachable(e.without_url().to_string()))?;
        parse_envelope(&body)
    }
}

fn parse_envelope(body: &[u8]) -> Result<BackendLogin, BackendError> {
    let envelope: Envelope = serde_json::from_slice(body)
        .map_err(|e| BackendError::Malformed(format!("envelope: {e}")))?;

    if !envelope.success {
        return Err(BackendError::Rejected { status: None });
    }

    let data = envelope
        .data
        .ok_or_else(|| BackendError::Malformed("missing data".to_string()))?;
    serde_json::from_value(data).map_err(|e| BackendError::Malformed(format!("data: {e}")))
}
