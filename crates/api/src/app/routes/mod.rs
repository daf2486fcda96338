use axum::{
    Router,
    routing::{get, post},
};

use crate::app::AppState;

pub mod auth;
pub mod system;

/// Router for every endpoint this service answers itself.
///
/// Page routes are rendered elsewhere; once the session gate lets them
/// through they land on the fallback.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(system::health))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/session", get(auth::session))
        .fallback(system::not_found)
}
