//! HS256 token issuing and verification.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use crate::{JwtClaims, TokenValidationError, UserAccount, validate_claims};

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("malformed or unsigned token: {0}")]
    Decode(#[from] jsonwebtoken::errors::Error),

    #[error(transparent)]
    Claims(#[from] TokenValidationError),
}

/// Verifies bearer tokens into claims.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, JwtError>;
}

/// Symmetric HS256 signer/validator.
pub struct Hs256Jwt {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl Hs256Jwt {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Time windows live in `issued_at`/`expires_at` and are checked by
        // `validate_claims`, not by the registered `exp` claim.
        validation.validate_exp = false;
        validation.required_spec_claims = HashSet::new();

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Mint a token for an account, valid from `now` for `ttl`.
    pub fn issue(
        &self,
        account: &UserAccount,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<String, JwtError> {
        let claims = JwtClaims {
            sub: account.id,
            household_id: account.household_id,
            username: account.username.clone(),
            roles: account.roles.clone(),
            issued_at: now,
            expires_at: now + ttl,
        };
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding,
        )?)
    }
}

impl JwtValidator for Hs256Jwt {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, JwtError> {
        let data = jsonwebtoken::decode::<JwtClaims>(token, &self.decoding, &self.validation)?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NewAccount, Role};
    use homestock_core::HouseholdId;

    fn account() -> UserAccount {
        UserAccount::register(
            NewAccount {
                username: "sam".to_string(),
                display_name: None,
                email: None,
            },
            "$argon2id$placeholder".to_string(),
            HouseholdId::new(),
            vec![Role::OWNER],
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn issued_token_validates_with_same_secret() {
        let jwt = Hs256Jwt::new(b"secret");
        let acct = account();
        let now = Utc::now();
        let token = jwt.issue(&acct, now, Duration::minutes(10)).unwrap();

        let claims = jwt.validate(&token, now + Duration::seconds(1)).unwrap();
        assert_eq!(claims.sub, acct.id);
        assert_eq!(claims.household_id, acct.household_id);
        assert_eq!(claims.roles, vec![Role::OWNER]);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let acct = account();
        let now = Utc::now();
        let token = Hs256Jwt::new(b"secret")
            .issue(&acct, now, Duration::minutes(10))
            .unwrap();

        let err = Hs256Jwt::new(b"other").validate(&token, now).unwrap_err();
        assert!(matches!(err, JwtError::Decode(_)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let jwt = Hs256Jwt::new(b"secret");
        let now = Utc::now();
        let token = jwt.issue(&account(), now, Duration::minutes(1)).unwrap();

        let err = jwt.validate(&token, now + Duration::minutes(2)).unwrap_err();
        assert!(matches!(err, JwtError::Claims(TokenValidationError::Expired)));
    }
}
