//! Contract with the external identity backend.
//!
//! The backend owns users, organizations, and password checks. This module
//! only defines the seam; the HTTP adapter lives in `dashgate-infra`.

use async_trait::async_trait;
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

use dashgate_core::EmailAddress;

/// User record returned by a successful backend login.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendUser {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub organization_id: Option<String>,
    #[serde(default)]
    pub onboarding_completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendOrganization {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// The `data` member of a successful login envelope.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BackendLogin {
    pub user: BackendUser,
    #[serde(default)]
    pub organization: Option<BackendOrganization>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The backend answered and refused the credentials.
    #[error("identity backend rejected the login (status {status:?})")]
    Rejected { status: Option<u16> },

    /// Network failure or timeout.
    #[error("identity backend unreachable: {0}")]
    Unreachable(String),

    /// The backend answered with something other than the expected envelope.
    #[error("identity backend returned a malformed response: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait IdentityBackend: Send + Sync {
    async fn login(
        &self,
        email: &EmailAddress,
        password: &SecretString,
    ) -> Result<BackendLogin, BackendError>;
}
