use axum::{
    extract::State,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;

use dashgate_auth::AuthorizationOutcome;

use crate::authz::{AuthState, authorize_request};
use crate::context::CurrentSession;

/// Gate every request on session state and route classification.
///
/// Allowed requests continue with [`CurrentSession`] in their extensions;
/// everything else is answered with a temporary redirect.
pub async fn session_gate(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let path = req.uri().path().to_owned();
    let authz = authorize_request(&state, &path, req.headers(), Utc::now());

    match authz.decision.outcome {
        AuthorizationOutcome::Allow => {
            req.extensions_mut().insert(CurrentSession::new(authz.session));
            next.run(req).await
        }
        AuthorizationOutcome::Redirect(redirect) => {
            let location = redirect.location();
            tracing::debug!(
                path = %path,
                rule = ?authz.decision.rule,
                location = %location,
                "redirecting request"
            );
            Redirect::temporary(&location).into_response()
        }
    }
}
