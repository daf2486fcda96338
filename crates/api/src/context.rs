use std::convert::Infallible;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
};
use axum_extra::extract::cookie::CookieJar;

use dashgate_auth::{SessionClaims, SessionView};

pub const SESSION_COOKIE: &str = "dashgate.session";

/// Session of the current request, as resolved by the authorization middleware.
///
/// Never rejects: requests without a valid session see `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurrentSession(Option<SessionClaims>);

impl CurrentSession {
    pub fn new(claims: Option<SessionClaims>) -> Self {
        Self(claims)
    }

    pub fn claims(&self) -> Option<&SessionClaims> {
        self.0.as_ref()
    }

    /// Client-facing view of the session, if any.
    pub fn view(&self) -> Option<SessionView> {
        self.0.as_ref().map(SessionClaims::view)
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CurrentSession {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<CurrentSession>()
            .cloned()
            .unwrap_or_default())
    }
}

/// Locate the inbound session token: the session cookie wins over a bearer header.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        let value = cookie.value().trim();
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }
    extract_bearer(headers).map(str::to_string)
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?;
    let header = header.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}
