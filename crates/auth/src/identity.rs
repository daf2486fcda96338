//! Verified identities and the adapters that normalize login results into them.
//!
//! Password logins and external-provider logins produce different payloads.
//! Both are funneled through [`IdentityAdapter`] so that session issuance has a
//! single input shape.

use secrecy::{ExposeSecret, SecretString};

use dashgate_core::{DomainError, DomainResult, EmailAddress, OrganizationId, UserId};

use crate::Role;
use crate::backend::BackendLogin;

/// A verified user identity, immutable for the lifetime of one login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: UserId,
    pub email: String,
    pub display_name: String,
    pub organization_id: Option<OrganizationId>,
    pub role: Role,
    pub onboarding_completed: bool,
}

/// Account data from an external identity provider.
///
/// The access token is carried into the session as an internal-only claim.
#[derive(Debug, Clone)]
pub struct ProviderAccount {
    pub provider: String,
    pub access_token: SecretString,
}

impl ProviderAccount {
    pub fn new(provider: impl Into<String>, access_token: impl Into<String>) -> Self {
        let access_token: String = access_token.into();
        Self {
            provider: provider.into(),
            access_token: SecretString::new(access_token.into()),
        }
    }
}

impl PartialEq for ProviderAccount {
    fn eq(&self, other: &Self) -> bool {
        self.provider == other.provider
            && self.access_token.expose_secret() == other.access_token.expose_secret()
    }
}

impl Eq for ProviderAccount {}

/// Capability to produce a verified [`Identity`] (and optionally the provider
/// account that vouched for it).
pub trait IdentityAdapter {
    fn identity(&self) -> DomainResult<Identity>;

    fn provider_account(&self) -> Option<ProviderAccount> {
        None
    }
}

impl IdentityAdapter for Identity {
    fn identity(&self) -> DomainResult<Identity> {
        Ok(self.clone())
    }
}

impl IdentityAdapter for BackendLogin {
    fn identity(&self) -> DomainResult<Identity> {
        let user = &self.user;

        let organization_id = match (&self.organization, &user.organization_id) {
            (Some(org), Some(user_org)) if org.id != *user_org => {
                return Err(DomainError::validation(
                    "user organization does not match organization payload",
                ));
            }
            (Some(org), _) => Some(org.id.as_str()),
            (None, user_org) => user_org.as_deref(),
        };

        normalize(
            &user.id,
            &user.email,
            user.name.as_deref(),
            organization_id,
            user.role.as_deref(),
            user.onboarding_completed,
        )
    }
}

/// Output of an external-provider (OAuth-style) exchange, after the identity
/// backend has linked the provider subject to a dashboard user.
#[derive(Debug, Clone)]
pub struct ProviderProfile {
    pub provider: String,
    pub user_id: String,
    pub email: String,
    pub name: Option<String>,
    pub organization_id: Option<String>,
    pub role: Option<String>,
    pub onboarding_completed: bool,
    pub access_token: SecretString,
}

impl IdentityAdapter for ProviderProfile {
    fn identity(&self) -> DomainResult<Identity> {
        normalize(
            &self.user_id,
            &self.email,
            self.name.as_deref(),
            self.organization_id.as_deref(),
            self.role.as_deref(),
            self.onboarding_completed,
        )
    }

    fn provider_account(&self) -> Option<ProviderAccount> {
        Some(ProviderAccount {
            provider: self.provider.clone(),
            access_token: self.access_token.clone(),
        })
    }
}

fn normalize(
    id: &str,
    email: &str,
    name: Option<&str>,
    organization_id: Option<&str>,
    role: Option<&str>,
    onboarding_completed: bool,
) -> DomainResult<Identity> {
    let id: UserId = id.trim().parse()?;
    let email = EmailAddress::parse(email)?;
    let organization_id = organization_id
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse::<OrganizationId>)
        .transpose()?;

    // Fall back to the address when the backend has no display name yet.
    let display_name = name
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(email.as_str())
        .to_string();

    let role = role
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|r| Role::new(r.to_string()))
        .unwrap_or_default();

    Ok(Identity {
        id,
        email: email.as_str().to_string(),
        display_name,
        organization_id,
        role,
        onboarding_completed,
    })
}
