//! `homestock-auth`: accounts, credentials and household-scoped authorization.
//!
//! This crate is intentionally decoupled from HTTP and storage.

pub mod account;
pub mod authorize;
pub mod claims;
pub mod jwt;
pub mod password;
pub mod permissions;
pub mod principal;
pub mod roles;

pub use account::{NewAccount, UserAccount, normalize_username, validate_password};
pub use authorize::{AuthzError, Principal, RequiresPermissions, authorize};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256Jwt, JwtError, JwtValidator};
pub use password::{PasswordError, hash_password, verify_password};
pub use permissions::{Permission, role_permissions};
pub use principal::{HouseholdMembership, PrincipalId};
pub use roles::Role;
