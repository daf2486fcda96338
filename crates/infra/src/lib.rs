//! `dashgate-infra`: I/O adapters for the auth boundary.
//!
//! Implementations of `dashgate-auth` traits that talk to the outside world.

pub mod identity_backend;

pub use identity_backend::{HttpBackendError, HttpIdentityBackend};
