use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use chrono::Utc;

use dashgate_auth::Credentials;

use crate::app::AppState;
use crate::app::dto::{LoginRequest, LoginResponse};
use crate::app::errors::{json_error, login_error_to_response};
use crate::context::CurrentSession;

pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Response {
    let Ok(Json(body)) = body else {
        return json_error(
            StatusCode::BAD_REQUEST,
            "invalid_request",
            "expected a JSON body with email and password",
        );
    };
    let credentials = Credentials::from(body);

    let issued = match state.login.login(&credentials, Utc::now()).await {
        Ok(issued) => issued,
        Err(err) => return login_error_to_response(err),
    };

    let cookie = match state.cookie.issue(issued.token.as_str()) {
        Ok(cookie) => cookie,
        Err(_) => {
            tracing::error!("session token is not a valid cookie value");
            return json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "session_error",
                "could not create session",
            );
        }
    };

    (
        StatusCode::OK,
        [(SET_COOKIE, cookie)],
        Json(LoginResponse {
            session: issued.claims.view(),
        }),
    )
        .into_response()
}

pub async fn logout(State(state): State<AppState>, session: CurrentSession) -> Response {
    if let Some(claims) = session.claims() {
        tracing::info!(user_id = %claims.sub, "session discarded");
    }
    (StatusCode::NO_CONTENT, [(SET_COOKIE, state.cookie.clear())]).into_response()
}

/// `currentSession()` for the presentation layer: the client view or `null`.
pub async fn session(session: CurrentSession) -> impl IntoResponse {
    Json(session.view())
}
