use thiserror::Error;

use homestock_core::HouseholdId;

use crate::{HouseholdMembership, Permission, PrincipalId};

/// A fully resolved principal for authorization decisions.
///
/// Construction is decoupled from storage and transport: the API derives the
/// membership from verified token claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub principal_id: PrincipalId,
    pub active_household_id: HouseholdId,
    pub membership: HouseholdMembership,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("household mismatch")]
    HouseholdMismatch,

    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

/// Operation-side authorization contract.
///
/// The API layer enforces these requirements before touching any store.
pub trait RequiresPermissions {
    fn required_permissions(&self) -> &[Permission];
}

impl RequiresPermissions for Permission {
    fn required_permissions(&self) -> &[Permission] {
        core::slice::from_ref(self)
    }
}

/// Authorize a principal within its active household.
///
/// Pure policy check: no IO, no panics.
pub fn authorize(principal: &Principal, required: &Permission) -> Result<(), AuthzError> {
    if principal.active_household_id != principal.membership.household_id {
        return Err(AuthzError::HouseholdMismatch);
    }

    let granted = principal
        .membership
        .permissions
        .iter()
        .any(|p| p.is_wildcard() || p == required);

    if granted {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}
