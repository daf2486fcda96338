use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use dashgate_auth::LoginError;

pub fn login_error_to_response(err: LoginError) -> axum::response::Response {
    match err {
        LoginError::InvalidCredentials => json_error(
            StatusCode::UNAUTHORIZED,
            "invalid_credentials",
            err.to_string(),
        ),
        LoginError::Unavailable => json_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "backend_unavailable",
            err.to_string(),
        ),
        LoginError::Issuance(e) => {
            tracing::error!(error = %e, "failed to issue session");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "session_error",
                "could not create session",
            )
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
