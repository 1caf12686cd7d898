use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role identifier used for RBAC.
///
/// Roles are opaque strings at this layer; [`crate::role_permissions`] maps the
/// household roles (`owner`, `member`, `viewer`) to permissions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const OWNER: Role = Role(Cow::Borrowed("owner"));
    pub const MEMBER: Role = Role(Cow::Borrowed("member"));
    pub const VIEWER: Role = Role(Cow::Borrowed("viewer"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Roles an owner may hand out when adding household members.
    pub fn is_assignable(&self) -> bool {
        matches!(self.as_str(), "owner" | "member" | "viewer")
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
