//! Application services: load from a store, apply domain rules, save back.
//!
//! Every call is scoped by the caller's household; records of other
//! households are indistinguishable from missing ones.

use std::sync::Arc;

use thiserror::Error;

use homestock_auth::{Hs256Jwt, JwtError, PasswordError, PrincipalId, UserAccount};
use homestock_budgeting::{Budget, BudgetId, Expense, ExpenseId};
use homestock_core::DomainError;
use homestock_grocery::{GroceryItem, GroceryItemId};
use homestock_inventory::{BarcodeId, BarcodeRecord, InventoryItem, InventoryItemId};

use crate::export::ExportError;
use crate::store::{InMemoryHouseholdStore, PostgresHouseholdStore, StoreError, HouseholdStore};

pub mod accounts;
pub mod barcodes;
pub mod budgeting;
pub mod grocery;
pub mod inventory;

pub use accounts::{AccountService, Session};
pub use barcodes::BarcodeService;
pub use budgeting::{BudgetService, ExpenseFilter};
pub use grocery::{GroceryFilter, GroceryService};
pub use inventory::{InventoryFilter, InventoryService};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Token(#[from] JwtError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

pub(crate) fn not_found() -> ServiceError {
    ServiceError::Domain(DomainError::not_found())
}

/// One store per record type.
#[derive(Clone)]
pub struct Stores {
    /// Username -> account, in the directory scope.
    pub accounts: Arc<dyn HouseholdStore<String, UserAccount>>,
    /// Account id -> username, per household.
    pub members: Arc<dyn HouseholdStore<PrincipalId, String>>,
    pub inventory: Arc<dyn HouseholdStore<InventoryItemId, InventoryItem>>,
    pub barcodes: Arc<dyn HouseholdStore<BarcodeId, BarcodeRecord>>,
    pub grocery: Arc<dyn HouseholdStore<GroceryItemId, GroceryItem>>,
    pub budgets: Arc<dyn HouseholdStore<BudgetId, Budget>>,
    pub expenses: Arc<dyn HouseholdStore<ExpenseId, Expense>>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            accounts: Arc::new(InMemoryHouseholdStore::new()),
            members: Arc::new(InMemoryHouseholdStore::new()),
            inventory: Arc::new(InMemoryHouseholdStore::new()),
            barcodes: Arc::new(InMemoryHouseholdStore::new()),
            grocery: Arc::new(InMemoryHouseholdStore::new()),
            budgets: Arc::new(InMemoryHouseholdStore::new()),
            expenses: Arc::new(InMemoryHouseholdStore::new()),
        }
    }

    pub fn postgres(pool: sqlx::PgPool) -> Self {
        Self {
            accounts: Arc::new(PostgresHouseholdStore::new(pool.clone(), "accounts")),
            members: Arc::new(PostgresHouseholdStore::new(pool.clone(), "members")),
            inventory: Arc::new(PostgresHouseholdStore::new(pool.clone(), "inventory_items")),
            barcodes: Arc::new(PostgresHouseholdStore::new(pool.clone(), "barcodes")),
            grocery: Arc::new(PostgresHouseholdStore::new(pool.clone(), "grocery_items")),
            budgets: Arc::new(PostgresHouseholdStore::new(pool.clone(), "budgets")),
            expenses: Arc::new(PostgresHouseholdStore::new(pool, "expenses")),
        }
    }
}

/// All services over one set of stores.
#[derive(Clone)]
pub struct Services {
    pub accounts: AccountService,
    pub inventory: InventoryService,
    pub barcodes: BarcodeService,
    pub grocery: GroceryService,
    pub budgets: BudgetService,
}

impl Services {
    pub fn new(stores: Stores, jwt: Arc<Hs256Jwt>, token_ttl: chrono::Duration) -> Self {
        Self {
            accounts: AccountService::new(stores.accounts, stores.members, jwt, token_ttl),
            inventory: InventoryService::new(stores.inventory.clone()),
            barcodes: BarcodeService::new(stores.barcodes),
            grocery: GroceryService::new(stores.grocery, stores.inventory),
            budgets: BudgetService::new(stores.budgets, stores.expenses),
        }
    }
}
