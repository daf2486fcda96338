//! `dashgate-auth`: session issuance and request authorization boundary.
//!
//! This crate is decoupled from HTTP and storage. The identity backend is
//! reached through the [`IdentityBackend`] trait.

pub mod authorize;
pub mod backend;
pub mod claims;
pub mod credentials;
pub mod identity;
pub mod login;
pub mod roles;
pub mod routes;
pub mod token;
pub mod verifier;

pub use authorize::{
    AuthorizationOutcome, Authorizer, Decision, DecisionRule, Redirect, RedirectTargets,
    SessionState, decide,
};
pub use backend::{BackendError, BackendLogin, BackendOrganization, BackendUser, IdentityBackend};
pub use claims::{SessionClaims, SessionView, TokenValidationError, build_claims, validate_claims};
pub use credentials::{CredentialError, CredentialPolicy, Credentials};
pub use identity::{Identity, IdentityAdapter, ProviderAccount, ProviderProfile};
pub use login::{LoginError, LoginService};
pub use roles::Role;
pub use routes::{RouteClassification, RouteTable, normalize_path};
pub use token::{IssuedSession, SessionReader, SessionToken, SessionTokenCodec, TokenError};
pub use verifier::{AuthFailure, CredentialVerifier};
