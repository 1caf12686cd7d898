use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use homestock_core::{DomainError, HouseholdId};

/// Identity of an authenticated principal (a household user account).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(Uuid);

impl PrincipalId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PrincipalId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<Uuid> for PrincipalId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<PrincipalId> for Uuid {
    fn from(value: PrincipalId) -> Self {
        value.0
    }
}

impl FromStr for PrincipalId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid = Uuid::from_str(s)
            .map_err(|e| DomainError::invalid_id(format!("PrincipalId: {e}")))?;
        Ok(Self(uuid))
    }
}

/// A principal's membership in a household.
///
/// This is an authorization boundary object: it states *which household* the
/// principal is acting within and which roles/permissions are granted there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HouseholdMembership {
    pub household_id: HouseholdId,
    pub roles: Vec<crate::Role>,
    pub permissions: Vec<crate::Permission>,
}

impl HouseholdMembership {
    /// Membership whose permissions are derived from the given roles.
    pub fn from_roles(household_id: HouseholdId, roles: &[crate::Role]) -> Self {
        let mut permissions: Vec<crate::Permission> = roles
            .iter()
            .flat_map(|r| crate::role_permissions(r.as_str()))
            .collect();
        permissions.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        permissions.dedup();

        Self {
            household_id,
            roles: roles.to_vec(),
            permissions,
        }
    }
}
