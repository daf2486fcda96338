//! HTTP application wiring (Axum router + service wiring).
//!
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses
//! - `cookie.rs`: session cookie attributes

use std::sync::Arc;

use axum::Router;
use tower::ServiceBuilder;

use dashgate_auth::{
    Authorizer, CredentialPolicy, CredentialVerifier, LoginService, RedirectTargets, RouteTable,
    SessionTokenCodec,
};
use dashgate_infra::{HttpBackendError, HttpIdentityBackend};

use crate::authz::AuthState;
use crate::config::{AppConfig, ConfigError};
use crate::middleware;

pub mod cookie;
pub mod dto;
pub mod errors;
pub mod routes;

pub use self::cookie::SessionCookie;

/// Shared, read-only application state.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthState,
    pub login: Arc<LoginService>,
    pub cookie: SessionCookie,
}

impl AppState {
    /// Construct every component from configuration. Fails instead of
    /// producing a half-configured service.
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let codec = Arc::new(
            SessionTokenCodec::new(&config.auth_secret)
                .map_err(|_| ConfigError::InvalidVar("AUTH_SECRET"))?,
        );

        let backend = HttpIdentityBackend::new(
            &config.identity_backend_url,
            config.identity_backend_timeout,
        )
        .map_err(|e| match e {
            HttpBackendError::InvalidBaseUrl(_) => ConfigError::InvalidVar("IDENTITY_BACKEND_URL"),
            HttpBackendError::Client(e) => ConfigError::HttpClient(e.to_string()),
        })?;

        let verifier = CredentialVerifier::new(
            Arc::new(backend),
            CredentialPolicy::new(config.min_password_length),
            config.identity_backend_timeout,
        );

        Ok(Self {
            auth: AuthState {
                sessions: codec.clone(),
                authorizer: Arc::new(Authorizer::new(
                    RouteTable::reference(),
                    RedirectTargets::reference(),
                )),
            },
            login: Arc::new(LoginService::new(verifier, codec, config.session_ttl)),
            cookie: SessionCookie::new(config.session_ttl, config.session_cookie_secure),
        })
    }
}

/// Build the full HTTP router (public entrypoint used by `main.rs`).
///
/// Every route, the fallback included, sits behind the session gate.
pub fn build_app(state: AppState) -> Router {
    let auth_state = state.auth.clone();

    routes::router()
        .with_state(state)
        .layer(
            ServiceBuilder::new().layer(axum::middleware::from_fn_with_state(
                auth_state,
                middleware::session_gate,
            )),
        )
}
