//! Session issuance flow: verified identity -> signed session.
//!
//! Password and provider logins converge on the same issuance step. A login
//! either returns a complete session or an error; nothing is issued halfway.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::credentials::Credentials;
use crate::identity::IdentityAdapter;
use crate::token::{IssuedSession, SessionTokenCodec, TokenError};
use crate::verifier::{AuthFailure, CredentialVerifier};

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("identity service unavailable")]
    Unavailable,

    #[error("failed to issue session: {0}")]
    Issuance(#[from] TokenError),
}

impl From<AuthFailure> for LoginError {
    fn from(value: AuthFailure) -> Self {
        if value.is_retryable() {
            Self::Unavailable
        } else {
            Self::InvalidCredentials
        }
    }
}

#[derive(Clone)]
pub struct LoginService {
    verifier: CredentialVerifier,
    codec: Arc<SessionTokenCodec>,
    ttl: Duration,
}

impl LoginService {
    pub fn new(verifier: CredentialVerifier, codec: Arc<SessionTokenCodec>, ttl: Duration) -> Self {
        Self { verifier, codec, ttl }
    }

    /// Password login.
    pub async fn login(
        &self,
        credentials: &Credentials,
        now: DateTime<Utc>,
    ) -> Result<IssuedSession, LoginError> {
        let identity = self.verifier.verify(credentials).await.map_err(|failure| {
            if failure.is_retryable() {
                tracing::warn!(reason = failure.kind(), "login failed: identity backend unavailable");
            } else {
                tracing::info!(reason = failure.kind(), "login rejected");
            }
            LoginError::from(failure)
        })?;

        self.issue(&identity, now)
    }

    /// Issue a session for any identity source (e.g. an external provider
    /// exchange). Provider account data, if present, is carried internally.
    pub fn issue(
        &self,
        source: &dyn IdentityAdapter,
        now: DateTime<Utc>,
    ) -> Result<IssuedSession, LoginError> {
        let identity = source.identity().map_err(|error| {
            tracing::info!(%error, "login rejected: identity could not be normalized");
            LoginError::InvalidCredentials
        })?;
        let account = source.provider_account();

        let issued = self.codec.issue(&identity, account.as_ref(), self.ttl, now)?;
        tracing::info!(
            user_id = %issued.claims.sub,
            onboarding_completed = issued.claims.onboarding_completed,
            provider = account.as_ref().map(|a| a.provider.as_str()),
            "session issued"
        );
        Ok(issued)
    }
}
