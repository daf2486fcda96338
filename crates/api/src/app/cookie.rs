use axum::http::HeaderValue;
use axum::http::header::InvalidHeaderValue;
use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::Duration;

use crate::context::SESSION_COOKIE;

/// Attributes of the session cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionCookie {
    max_age_secs: i64,
    secure: bool,
}

impl SessionCookie {
    pub fn new(ttl: Duration, secure: bool) -> Self {
        Self {
            max_age_secs: ttl.num_seconds(),
            secure,
        }
    }

    /// `Set-Cookie` value attaching `token` for the session lifetime.
    pub fn issue(&self, token: &str) -> Result<HeaderValue, InvalidHeaderValue> {
        HeaderValue::from_str(&self.build(token, self.max_age_secs).to_string())
    }

    /// `Set-Cookie` value discarding the session.
    pub fn clear(&self) -> HeaderValue {
        HeaderValue::from_str(&self.build("", 0).to_string())
            .unwrap_or_else(|_| HeaderValue::from_static("dashgate.session=; Path=/; Max-Age=0"))
    }

    fn build<'c>(&self, value: &'c str, max_age_secs: i64) -> Cookie<'c> {
        Cookie::build((SESSION_COOKIE, value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .max_age(::cookie::time::Duration::seconds(max_age_secs))
            .build()
    }
}
