use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier.
///
/// Permissions are modeled as opaque strings (e.g. "inventory.read").
/// The wildcard permission `"*"` is granted to household owners.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const WILDCARD: Permission = Permission(Cow::Borrowed("*"));

    pub const INVENTORY_READ: Permission = Permission(Cow::Borrowed("inventory.read"));
    pub const INVENTORY_WRITE: Permission = Permission(Cow::Borrowed("inventory.write"));
    pub const GROCERY_READ: Permission = Permission(Cow::Borrowed("grocery.read"));
    pub const GROCERY_WRITE: Permission = Permission(Cow::Borrowed("grocery.write"));
    pub const BUDGET_READ: Permission = Permission(Cow::Borrowed("budget.read"));
    pub const BUDGET_WRITE: Permission = Permission(Cow::Borrowed("budget.write"));
    pub const BARCODE_READ: Permission = Permission(Cow::Borrowed("barcode.read"));
    pub const BARCODE_WRITE: Permission = Permission(Cow::Borrowed("barcode.write"));
    pub const IOT_READ: Permission = Permission(Cow::Borrowed("iot.read"));
    pub const IOT_CONTROL: Permission = Permission(Cow::Borrowed("iot.control"));
    pub const REPORTS_READ: Permission = Permission(Cow::Borrowed("reports.read"));
    pub const USERS_READ: Permission = Permission(Cow::Borrowed("users.read"));
    pub const USERS_MANAGE: Permission = Permission(Cow::Borrowed("users.manage"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

const READ_PERMISSIONS: [Permission; 7] = [
    Permission::INVENTORY_READ,
    Permission::GROCERY_READ,
    Permission::BUDGET_READ,
    Permission::BARCODE_READ,
    Permission::IOT_READ,
    Permission::REPORTS_READ,
    Permission::USERS_READ,
];

const WRITE_PERMISSIONS: [Permission; 5] = [
    Permission::INVENTORY_WRITE,
    Permission::GROCERY_WRITE,
    Permission::BUDGET_WRITE,
    Permission::BARCODE_WRITE,
    Permission::IOT_CONTROL,
];

/// Household role → permission mapping.
///
/// Unknown roles grant nothing.
pub fn role_permissions(role: &str) -> Vec<Permission> {
    match role {
        "owner" => vec![Permission::WILDCARD],
        "member" => READ_PERMISSIONS
            .iter()
            .chain(WRITE_PERMISSIONS.iter())
            .cloned()
            .collect(),
        "viewer" => READ_PERMISSIONS.to_vec(),
        _ => Vec::new(),
    }
}
