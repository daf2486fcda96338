//! Credential verification against the identity backend.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::backend::{BackendError, IdentityBackend};
use crate::credentials::{CredentialError, CredentialPolicy, Credentials};
use crate::identity::{Identity, IdentityAdapter};

pub const DEFAULT_BACKEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Why a verification failed.
///
/// The `Display` text is the same for every credential problem so callers can
/// surface it directly without revealing which check failed. Use
/// [`AuthFailure::kind`] for logs.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    #[error("invalid email or password")]
    MissingCredentials,

    #[error("invalid email or password")]
    InvalidEmail,

    #[error("invalid email or password")]
    WeakPassword,

    #[error("invalid email or password")]
    BackendRejected,

    #[error("identity service unavailable")]
    BackendUnreachable,

    #[error("invalid email or password")]
    MalformedResponse,
}

impl AuthFailure {
    /// Only outages are worth retrying, and only by the caller.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::BackendUnreachable)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingCredentials => "missing_credentials",
            Self::InvalidEmail => "invalid_email",
            Self::WeakPassword => "weak_password",
            Self::BackendRejected => "backend_rejected",
            Self::BackendUnreachable => "backend_unreachable",
            Self::MalformedResponse => "malformed_response",
        }
    }
}

impl From<CredentialError> for AuthFailure {
    fn from(value: CredentialError) -> Self {
        match value {
            CredentialError::MissingCredentials => Self::MissingCredentials,
            CredentialError::InvalidEmail => Self::InvalidEmail,
            CredentialError::WeakPassword => Self::WeakPassword,
        }
    }
}

impl From<BackendError> for AuthFailure {
    fn from(value: BackendError) -> Self {
        match value {
            BackendError::Rejected { .. } => Self::BackendRejected,
            BackendError::Unreachable(_) => Self::BackendUnreachable,
            BackendError::Malformed(_) => Self::MalformedResponse,
        }
    }
}

/// Exchanges credentials for a verified [`Identity`].
#[derive(Clone)]
pub struct CredentialVerifier {
    backend: Arc<dyn IdentityBackend>,
    policy: CredentialPolicy,
    timeout: Duration,
}

impl CredentialVerifier {
    pub fn new(backend: Arc<dyn IdentityBackend>, policy: CredentialPolicy, timeout: Duration) -> Self {
        Self {
            backend,
            policy,
            timeout,
        }
    }

    /// Verify credentials.
    ///
    /// Local policy checks short-circuit before any network call. The backend
    /// call is bounded by the configured timeout.
    pub async fn verify(&self, credentials: &Credentials) -> Result<Identity, AuthFailure> {
        let email = self.policy.validate(credentials)?;

        let login = match tokio::time::timeout(
            self.timeout,
            self.backend.login(&email, &credentials.password),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!(timeout_ms = self.timeout.as_millis() as u64, "identity backend timed out");
                return Err(AuthFailure::BackendUnreachable);
            }
        };

        login.identity().map_err(|error| {
            tracing::warn!(%error, "identity backend returned an unusable user record");
            AuthFailure::MalformedResponse
        })
    }
}
