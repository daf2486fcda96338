//! Login credentials and their local well-formedness policy.

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use dashgate_core::EmailAddress;

pub const DEFAULT_MIN_PASSWORD_LENGTH: usize = 6;

/// An email/password pair submitted at login. Never persisted.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        let password: String = password.into();
        Self {
            email: email.into(),
            password: SecretString::new(password.into()),
        }
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CredentialError {
    #[error("email and password are required")]
    MissingCredentials,

    #[error("email is not a valid address")]
    InvalidEmail,

    #[error("password is shorter than the minimum length")]
    WeakPassword,
}

/// Local checks applied before credentials leave the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialPolicy {
    pub min_password_length: usize,
}

impl Default for CredentialPolicy {
    fn default() -> Self {
        Self {
            min_password_length: DEFAULT_MIN_PASSWORD_LENGTH,
        }
    }
}

impl CredentialPolicy {
    pub fn new(min_password_length: usize) -> Self {
        Self { min_password_length }
    }

    /// Validate credentials and return the parsed email address.
    ///
    /// Password length is counted in characters, not bytes.
    pub fn validate(&self, credentials: &Credentials) -> Result<EmailAddress, CredentialError> {
        let password = credentials.password.expose_secret();
        if credentials.email.trim().is_empty() || password.is_empty() {
            return Err(CredentialError::MissingCredentials);
        }

        let email =
            EmailAddress::parse(&credentials.email).map_err(|_| CredentialError::InvalidEmail)?;

        if password.chars().count() < self.min_password_length {
            return Err(CredentialError::WeakPassword);
        }

        Ok(email)
    }
}
