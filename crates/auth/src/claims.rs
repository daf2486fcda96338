use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use dashgate_core::{OrganizationId, UserId};

use crate::{Identity, ProviderAccount, Role};

/// Session claims carried by a session token.
///
/// Derived 1:1 from an [`Identity`] plus the validity window. Timestamps are
/// whole seconds so they survive the token encoding unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject / user identifier.
    pub sub: UserId,

    pub email: String,

    pub name: String,

    pub organization_id: Option<OrganizationId>,

    pub role: Role,

    pub onboarding_completed: bool,

    /// Issued-at timestamp.
    #[serde(rename = "iat", with = "chrono::serde::ts_seconds")]
    pub issued_at: DateTime<Utc>,

    /// Expiration timestamp.
    #[serde(rename = "exp", with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,

    /// Internal-only provider account. Sealed separately by the token codec
    /// and never part of [`SessionView`].
    #[serde(skip)]
    pub provider: Option<ProviderAccount>,
}

impl SessionClaims {
    pub fn is_onboarded(&self) -> bool {
        self.onboarding_completed
    }

    /// Client-facing projection of the claims.
    pub fn view(&self) -> SessionView {
        SessionView {
            id: self.sub,
            email: self.email.clone(),
            name: self.name.clone(),
            organization_id: self.organization_id,
            role: self.role.clone(),
            onboarding_completed: self.onboarding_completed,
            expires_at: self.expires_at,
        }
    }
}

/// What the presentation layer gets to see of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub organization_id: Option<OrganizationId>,
    pub role: Role,
    pub onboarding_completed: bool,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,
}

/// Build session claims from a verified identity.
///
/// Pure transform: identical inputs produce identical claims. `issued_at` is
/// truncated to whole seconds and `expires_at = issued_at + ttl`.
pub fn build_claims(
    identity: &Identity,
    provider: Option<&ProviderAccount>,
    issued_at: DateTime<Utc>,
    ttl: Duration,
) -> Result<SessionClaims, TokenValidationError> {
    if ttl <= Duration::zero() || ttl.subsec_nanos() != 0 {
        return Err(TokenValidationError::InvalidTimeWindow);
    }

    let issued_at = issued_at.trunc_subsecs(0);
    let expires_at = issued_at
        .checked_add_signed(ttl)
        .ok_or(TokenValidationError::InvalidTimeWindow)?;

    Ok(SessionClaims {
        sub: identity.id,
        email: identity.email.clone(),
        name: identity.display_name.clone(),
        organization_id: identity.organization_id,
        role: identity.role.clone(),
        onboarding_completed: identity.onboarding_completed,
        issued_at,
        expires_at,
        provider: provider.cloned(),
    })
}

/// Deterministically validate the claim time window.
///
/// Signature verification happens in the token codec; this checks only that
/// `issued_at <= now < expires_at`.
pub fn validate_claims(claims: &SessionClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.expires_at <= claims.issued_at {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.issued_at {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.expires_at {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}
