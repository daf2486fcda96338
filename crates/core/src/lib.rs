//! `dashgate-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod email;
pub mod error;
pub mod id;
pub mod value_object;

pub use email::EmailAddress;
pub use error::{DomainError, DomainResult};
pub use id::{OrganizationId, UserId};
pub use value_object::ValueObject;
