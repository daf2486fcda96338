//! Email address value object.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::{DomainError, DomainResult, ValueObject};

static EMAIL_GRAMMAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*\.[A-Za-z]{2,}$")
        .expect("email grammar is a valid regex")
});

/// A syntactically valid email address.
///
/// Surrounding whitespace is trimmed; case is preserved because the identity
/// backend owns address normalization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("email is required"));
        }
        if trimmed.len() > 254 || !EMAIL_GRAMMAR.is_match(trimmed) {
            return Err(DomainError::validation("email is not a valid address"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueObject for EmailAddress {}

impl core::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_addresses() {
        for ok in ["alice@example.com", "bob.smith+tag@mail.example.co.uk", "  carol@ex.io "] {
            assert!(EmailAddress::parse(ok).is_ok(), "{ok} should parse");
        }
        assert_eq!(EmailAddress::parse(" carol@ex.io ").unwrap().as_str(), "carol@ex.io");
    }

    #[test]
    fn rejects_malformed_addresses() {
        for bad in ["", "   ", "invalid-email", "a@b", "@example.com", "a b@example.com", "a@-x.com"] {
            assert!(EmailAddress::parse(bad).is_err(), "{bad:?} should be rejected");
        }
    }
}
