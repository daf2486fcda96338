use serde::{Deserialize, Serialize};

use dashgate_auth::{Credentials, SessionView};

/// Body of `POST /api/auth/login`.
///
/// Absent fields deserialize as empty so they fail the credential policy
/// like any other bad input.
#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl From<LoginRequest> for Credentials {
    fn from(value: LoginRequest) -> Self {
        Credentials::new(value.email, value.password)
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub session: SessionView,
}
