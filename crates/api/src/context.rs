use homestock_auth::{PrincipalId, Role};
use homestock_core::HouseholdId;

/// Household context for a request.
///
/// Taken from the verified token; every protected route is scoped by it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct HouseholdContext {
    household_id: HouseholdId,
}

impl HouseholdContext {
    pub fn new(household_id: HouseholdId) -> Self {
        Self { household_id }
    }

    pub fn household_id(&self) -> HouseholdId {
        self.household_id
    }
}

/// Principal context for a request (authenticated identity + roles).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal_id: PrincipalId,
    username: String,
    roles: Vec<Role>,
}

impl PrincipalContext {
    pub fn new(principal_id: PrincipalId, username: String, roles: Vec<Role>) -> Self {
        Self {
            principal_id,
            username,
            roles,
        }
    }

    pub fn principal_id(&self) -> PrincipalId {
        self.principal_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }
}
