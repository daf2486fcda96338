//! Request-level authorization: token -> session -> route decision.
//!
//! Runs before any page or handler logic. Pure with respect to the request:
//! no shared mutable state is touched.

use std::sync::Arc;

use axum::http::HeaderMap;
use chrono::{DateTime, Utc};

use dashgate_auth::{Authorizer, Decision, SessionClaims, SessionReader};

use crate::context::session_token;

#[derive(Clone)]
pub struct AuthState {
    pub sessions: Arc<dyn SessionReader>,
    pub authorizer: Arc<Authorizer>,
}

/// Outcome of authorizing one request, with the session it was decided on.
#[derive(Debug, Clone)]
pub struct RequestAuthorization {
    pub decision: Decision,
    pub session: Option<SessionClaims>,
}

/// Resolve the session for the request headers. Invalid tokens yield `None`.
pub fn current_session(
    state: &AuthState,
    headers: &HeaderMap,
    now: DateTime<Utc>,
) -> Option<SessionClaims> {
    let token = session_token(headers);
    state.sessions.current_session(token.as_deref(), now)
}

pub fn authorize_request(
    state: &AuthState,
    path: &str,
    headers: &HeaderMap,
    now: DateTime<Utc>,
) -> RequestAuthorization {
    let session = current_session(state, headers, now);
    let decision = state.authorizer.authorize(path, session.as_ref());
    RequestAuthorization { decision, session }
}
