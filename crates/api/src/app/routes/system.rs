use axum::{
    http::{StatusCode, Uri},
    response::Response,
};

use crate::app::errors::json_error;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn not_found(uri: Uri) -> Response {
    json_error(
        StatusCode::NOT_FOUND,
        "not_found",
        format!("no handler for {}", uri.path()),
    )
}
