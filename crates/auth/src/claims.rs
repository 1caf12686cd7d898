use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use homestock_core::HouseholdId;

use crate::{PrincipalId, Role};

/// JWT claims model (transport-agnostic).
///
/// The minimal set of claims HomeStock expects once a token has been
/// decoded and its signature verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject / principal identifier.
    pub sub: PrincipalId,

    /// Household the token acts within.
    pub household_id: HouseholdId,

    /// Login name, for display and audit fields.
    pub username: String,

    /// Roles granted within the household.
    pub roles: Vec<Role>,

    /// Issued-at timestamp.
    pub issued_at: DateTime<Utc>,

    /// Expiration timestamp.
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,
}

/// Deterministically validate JWT claims.
///
/// This validates the *claims* only; signature verification lives in [`crate::jwt`].
pub fn validate_claims(claims: &JwtClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.expires_at <= claims.issued_at {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.issued_at {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.expires_at {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn claims(issued_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> JwtClaims {
        JwtClaims {
            sub: PrincipalId::new(),
            household_id: HouseholdId::new(),
            username: "alex".to_string(),
            roles: vec![Role::OWNER],
            issued_at,
            expires_at,
        }
    }

    #[test]
    fn accepts_token_inside_window() {
        let now = Utc::now();
        let c = claims(now - Duration::minutes(1), now + Duration::minutes(1));
        assert_eq!(validate_claims(&c, now), Ok(()));
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let now = Utc::now();
        let c = claims(now - Duration::minutes(5), now);
        assert_eq!(validate_claims(&c, now), Err(TokenValidationError::Expired));
    }

    #[test]
    fn future_tokens_are_not_yet_valid() {
        let now = Utc::now();
        let c = claims(now + Duration::minutes(1), now + Duration::minutes(5));
        assert_eq!(validate_claims(&c, now), Err(TokenValidationError::NotYetValid));
    }

    #[test]
    fn inverted_window_is_rejected() {
        let now = Utc::now();
        let c = claims(now, now - Duration::seconds(1));
        assert_eq!(validate_claims(&c, now), Err(TokenValidationError::InvalidTimeWindow));
    }
}
