use std::sync::Arc;

use chrono::Utc;

use homestock_auth::{
    Hs256Jwt, NewAccount, PrincipalId, Role, UserAccount, hash_password, normalize_username,
    validate_password, verify_password,
};
use homestock_core::{DomainError, HouseholdId};

use super::{ServiceError, ServiceResult, not_found};
use crate::store::{DIRECTORY_SCOPE, HouseholdStore};

/// A freshly issued token and the account it belongs to.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub account: UserAccount,
}

/// Registration, login and household membership.
#[derive(Clone)]
pub struct AccountService {
    accounts: Arc<dyn HouseholdStore<String, UserAccount>>,
    members: Arc<dyn HouseholdStore<PrincipalId, String>>,
    jwt: Arc<Hs256Jwt>,
    token_ttl: chrono::Duration,
}

async fn hash_blocking(password: String) -> ServiceResult<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ServiceError::Internal(e.to_string()))?
        .map_err(ServiceError::from)
}

async fn verify_blocking(password: String, phc: String) -> ServiceResult<bool> {
    tokio::task::spawn_blocking(move || verify_password(&password, &phc))
        .await
        .map_err(|e| ServiceError::Internal(e.to_string()))?
        .map_err(ServiceError::from)
}

impl AccountService {
    pub fn new(
        accounts: Arc<dyn HouseholdStore<String, UserAccount>>,
        members: Arc<dyn HouseholdStore<PrincipalId, String>>,
        jwt: Arc<Hs256Jwt>,
        token_ttl: chrono::Duration,
    ) -> Self {
        Self {
            accounts,
            members,
            jwt,
            token_ttl,
        }
    }

    /// Create a new household with `input` as its owner.
    pub async fn register(&self, input: NewAccount, password: &str) -> ServiceResult<Session> {
        let household_id = HouseholdId::new();
        let account = self
            .create_account(household_id, input, password, Role::OWNER)
            .await?;
        tracing::info!(household_id = %household_id, username = %account.username, "household registered");
        self.session(account)
    }

    pub async fn login(&self, username: &str, password: &str) -> ServiceResult<Session> {
        let username = normalize_username(username).map_err(|_| ServiceError::InvalidCredentials)?;
        let account = self
            .accounts
            .get(DIRECTORY_SCOPE, &username)
            .await?
            .ok_or(ServiceError::InvalidCredentials)?;

        if !verify_blocking(password.to_string(), account.password_hash.clone()).await? {
            tracing::debug!(username = %username, "login rejected");
            return Err(ServiceError::InvalidCredentials);
        }
        self.session(account)
    }

    /// Add an account to an existing household.
    pub async fn add_member(
        &self,
        household_id: HouseholdId,
        input: NewAccount,
        password: &str,
        role: Role,
    ) -> ServiceResult<UserAccount> {
        let account = self.create_account(household_id, input, password, role).await?;
        tracing::info!(household_id = %household_id, username = %account.username, "member added");
        Ok(account)
    }

    pub async fn get(&self, household_id: HouseholdId, id: PrincipalId) -> ServiceResult<UserAccount> {
        let username = self.members.get(household_id, &id).await?.ok_or_else(not_found)?;
        let account = self
            .accounts
            .get(DIRECTORY_SCOPE, &username)
            .await?
            .ok_or_else(not_found)?;
        if account.household_id != household_id {
            return Err(not_found());
        }
        Ok(account)
    }

    /// Household members ordered by username.
    pub async fn list_members(&self, household_id: HouseholdId) -> ServiceResult<Vec<UserAccount>> {
        let mut usernames = self.members.list(household_id).await?;
        usernames.sort();

        let mut out = Vec::with_capacity(usernames.len());
        for username in usernames {
            if let Some(account) = self.accounts.get(DIRECTORY_SCOPE, &username).await? {
                if account.household_id == household_id {
                    out.push(account);
                }
            }
        }
        Ok(out)
    }

    pub async fn remove_member(
        &self,
        household_id: HouseholdId,
        actor: PrincipalId,
        id: PrincipalId,
    ) -> ServiceResult<()> {
        if actor == id {
            return Err(DomainError::invariant("cannot remove your own account").into());
        }
        let username = self.members.remove(household_id, &id).await?.ok_or_else(not_found)?;
        self.accounts.remove(DIRECTORY_SCOPE, &username).await?;
        tracing::info!(household_id = %household_id, username = %username, "member removed");
        Ok(())
    }

    pub async fn change_password(
        &self,
        household_id: HouseholdId,
        id: PrincipalId,
        current: &str,
        new: &str,
    ) -> ServiceResult<()> {
        let mut account = self.get(household_id, id).await?;
        if !verify_blocking(current.to_string(), account.password_hash.clone()).await? {
            return Err(ServiceError::InvalidCredentials);
        }
        validate_password(new)?;

        account.password_hash = hash_blocking(new.to_string()).await?;
        self.accounts
            .upsert(DIRECTORY_SCOPE, account.username.clone(), account)
            .await?;
        Ok(())
    }

    async fn create_account(
        &self,
        household_id: HouseholdId,
        input: NewAccount,
        password: &str,
        role: Role,
    ) -> ServiceResult<UserAccount> {
        // Cheap checks before paying for a hash.
        let username = normalize_username(&input.username)?;
        validate_password(password)?;
        if self.accounts.get(DIRECTORY_SCOPE, &username).await?.is_some() {
            return Err(username_taken(&username));
        }

        let hash = hash_blocking(password.to_string()).await?;
        let account = UserAccount::register(input, hash, household_id, vec![role], Utc::now())?;

        if !self
            .accounts
            .insert_new(DIRECTORY_SCOPE, account.username.clone(), account.clone())
            .await?
        {
            return Err(username_taken(&account.username));
        }
        self.members
            .upsert(household_id, account.id, account.username.clone())
            .await?;
        Ok(account)
    }

    fn session(&self, account: UserAccount) -> ServiceResult<Session> {
        let token = self.jwt.issue(&account, Utc::now(), self.token_ttl)?;
        Ok(Session { token, account })
    }
}

fn username_taken(username: &str) -> ServiceError {
    DomainError::conflict(format!("username '{username}' is already taken")).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryHouseholdStore;
    use homestock_auth::JwtValidator;

    fn service() -> AccountService {
        AccountService::new(
            Arc::new(InMemoryHouseholdStore::new()),
            Arc::new(InMemoryHouseholdStore::new()),
            Arc::new(Hs256Jwt::new(b"test-secret")),
            chrono::Duration::minutes(30),
        )
    }

    fn new_account(username: &str) -> NewAccount {
        NewAccount {
            username: username.to_string(),
            display_name: None,
            email: None,
        }
    }

    #[tokio::test]
    async fn register_creates_owner_and_valid_token() {
        let svc = service();
        let session = svc.register(new_account("Alex"), "hunter2hunter2").await.unwrap();

        assert_eq!(session.account.username, "alex");
        assert!(session.account.is_owner());

        let claims = Hs256Jwt::new(b"test-secret")
            .validate(&session.token, Utc::now())
            .unwrap();
        assert_eq!(claims.sub, session.account.id);
        assert_eq!(claims.household_id, session.account.household_id);
    }

    #[tokio::test]
    async fn usernames_are_unique_across_households() {
        let svc = service();
        svc.register(new_account("alex"), "hunter2hunter2").await.unwrap();
        let err = svc.register(new_account("ALEX"), "hunter2hunter2").await.unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::Conflict(_))));
    }

    #[tokio::test]
    async fn login_checks_password() {
        let svc = service();
        svc.register(new_account("alex"), "hunter2hunter2").await.unwrap();

        assert!(svc.login(" Alex ", "hunter2hunter2").await.is_ok());
        assert!(matches!(
            svc.login("alex", "wrong-password").await.unwrap_err(),
            ServiceError::InvalidCredentials
        ));
        assert!(matches!(
            svc.login("nobody", "hunter2hunter2").await.unwrap_err(),
            ServiceError::InvalidCredentials
        ));
    }

    #[tokio::test]
    async fn members_are_scoped_to_their_household() {
        let svc = service();
        let owner = svc.register(new_account("alex"), "hunter2hunter2").await.unwrap().account;
        let other = svc.register(new_account("sam"), "hunter2hunter2").await.unwrap().account;

        let kid = svc
            .add_member(owner.household_id, new_account("robin"), "password1", Role::VIEWER)
            .await
            .unwrap();

        let names: Vec<String> = svc
            .list_members(owner.household_id)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.username)
            .collect();
        assert_eq!(names, vec!["alex", "robin"]);

        assert!(svc.get(other.household_id, kid.id).await.is_err());
        assert!(svc.remove_member(other.household_id, other.id, kid.id).await.is_err());
        assert!(svc.remove_member(owner.household_id, owner.id, owner.id).await.is_err());

        svc.remove_member(owner.household_id, owner.id, kid.id).await.unwrap();
        assert!(svc.login("robin", "password1").await.is_err());
    }

    #[tokio::test]
    async fn change_password_requires_current() {
        let svc = service();
        let owner = svc.register(new_account("alex"), "hunter2hunter2").await.unwrap().account;

        assert!(matches!(
            svc.change_password(owner.household_id, owner.id, "nope-nope", "new-password")
                .await
                .unwrap_err(),
            ServiceError::InvalidCredentials
        ));
        svc.change_password(owner.household_id, owner.id, "hunter2hunter2", "new-password")
            .await
            .unwrap();
        assert!(svc.login("alex", "new-password").await.is_ok());
        assert!(svc.login("alex", "hunter2hunter2").await.is_err());
    }
}
