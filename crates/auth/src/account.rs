//! Household user accounts.
//!
//! An account belongs to exactly one household. The first account of a
//! household is its owner; owners add further members.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use homestock_core::{DomainError, DomainResult, Entity, HouseholdId, optional_text};

use crate::{PrincipalId, Role};

pub const MIN_PASSWORD_LEN: usize = 8;
const MAX_PASSWORD_LEN: usize = 256;

/// Registration input (password is handled separately so it never sits in
/// a serializable struct).
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: PrincipalId,
    pub household_id: HouseholdId,
    pub username: String,
    pub display_name: String,
    pub email: Option<String>,
    pub password_hash: String,
    pub roles: Vec<Role>,
    pub created_at: DateTime<Utc>,
}

impl Entity for UserAccount {
    type Id = PrincipalId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Lowercase + trim a login name and check its alphabet.
pub fn normalize_username(raw: &str) -> DomainResult<String> {
    let name = raw.trim().to_lowercase();
    let len = name.chars().count();
    if !(3..=32).contains(&len) {
        return Err(DomainError::validation(
            "username must be between 3 and 32 characters",
        ));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '.' | '-'))
    {
        return Err(DomainError::validation(
            "username may only contain a-z, 0-9, '_', '.' and '-'",
        ));
    }
    Ok(name)
}

pub fn validate_password(plain: &str) -> DomainResult<()> {
    let len = plain.chars().count();
    if len < MIN_PASSWORD_LEN {
        return Err(DomainError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if len > MAX_PASSWORD_LEN {
        return Err(DomainError::validation("password is too long"));
    }
    Ok(())
}

fn normalize_email(raw: Option<&str>) -> DomainResult<Option<String>> {
    let Some(email) = optional_text("email", raw, 254)? else {
        return Ok(None);
    };
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
            Ok(Some(email.to_lowercase()))
        }
        _ => Err(DomainError::validation("email address is malformed")),
    }
}

impl UserAccount {
    pub fn register(
        input: NewAccount,
        password_hash: String,
        household_id: HouseholdId,
        roles: Vec<Role>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let username = normalize_username(&input.username)?;
        let display_name = optional_text("display_name", input.display_name.as_deref(), 80)?
            .unwrap_or_else(|| username.clone());
        let email = normalize_email(input.email.as_deref())?;

        if roles.is_empty() {
            return Err(DomainError::invariant("account needs at least one role"));
        }
        if let Some(bad) = roles.iter().find(|r| !r.is_assignable()) {
            return Err(DomainError::validation(format!("unknown role '{bad}'")));
        }

        Ok(Self {
            id: PrincipalId::new(),
            household_id,
            username,
            display_name,
            email,
            password_hash,
            roles,
            created_at: now,
        })
    }

    pub fn is_owner(&self) -> bool {
        self.roles.contains(&Role::OWNER)
    }
}
