//! API-side authorization guard.
//!
//! Handlers call this before touching any store; domain crates and services
//! stay auth-agnostic.

use homestock_auth::{AuthzError, HouseholdMembership, Principal, RequiresPermissions, authorize};

use crate::context::{HouseholdContext, PrincipalContext};

/// Check every permission `required` asks for in the current request context.
pub fn authorize_request<R: RequiresPermissions + ?Sized>(
    household: &HouseholdContext,
    principal: &PrincipalContext,
    required: &R,
) -> Result<(), AuthzError> {
    let principal = Principal {
        principal_id: principal.principal_id(),
        active_household_id: household.household_id(),
        membership: HouseholdMembership::from_roles(household.household_id(), principal.roles()),
    };

    for perm in required.required_permissions() {
        authorize(&principal, perm)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use homestock_auth::{Permission, PrincipalId, Role};
    use homestock_core::HouseholdId;

    fn ctx(role: Role) -> (HouseholdContext, PrincipalContext) {
        (
            HouseholdContext::new(HouseholdId::new()),
            PrincipalContext::new(PrincipalId::new(), "alex".into(), vec![role]),
        )
    }

    #[test]
    fn viewers_read_but_do_not_write() {
        let (h, p) = ctx(Role::VIEWER);
        assert!(authorize_request(&h, &p, &Permission::INVENTORY_READ).is_ok());
        assert!(matches!(
            authorize_request(&h, &p, &Permission::INVENTORY_WRITE),
            Err(AuthzError::Forbidden(_))
        ));
    }

    #[test]
    fn members_cannot_manage_users() {
        let (h, p) = ctx(Role::MEMBER);
        assert!(authorize_request(&h, &p, &Permission::GROCERY_WRITE).is_ok());
        assert!(authorize_request(&h, &p, &Permission::USERS_MANAGE).is_err());
    }

    #[test]
    fn owners_hold_everything() {
        let (h, p) = ctx(Role::OWNER);
        assert!(authorize_request(&h, &p, &Permission::USERS_MANAGE).is_ok());
        assert!(authorize_request(&h, &p, &Permission::IOT_CONTROL).is_ok());
    }

    #[test]
    fn unknown_roles_get_nothing() {
        let (h, p) = ctx(Role::new("admin"));
        assert!(authorize_request(&h, &p, &Permission::INVENTORY_READ).is_err());
    }
}
