use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role of a user within their organization.
///
/// Roles are opaque strings at this layer: the identity backend owns the
/// vocabulary and unknown values are carried through verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const ADMIN: Role = Role(Cow::Borrowed("admin"));
    pub const MEMBER: Role = Role(Cow::Borrowed("member"));
    pub const VIEWER: Role = Role(Cow::Borrowed("viewer"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::MEMBER
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_serialize_as_plain_strings() {
        assert_eq!(serde_json::to_string(&Role::VIEWER).unwrap(), "\"viewer\"");
        let custom: Role = serde_json::from_str("\"billing-admin\"").unwrap();
        assert_eq!(custom, Role::new("billing-admin"));
        assert_eq!(custom.to_string(), "billing-admin");
    }

    #[test]
    fn default_role_is_member() {
        assert_eq!(Role::default(), Role::MEMBER);
    }
}
