use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use homestock_auth::{PrincipalId, Role, UserAccount};
use homestock_budgeting::BudgetId;
use homestock_core::HouseholdId;
use homestock_infra::services::Session;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub username: String,
    pub password: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    /// `member` when omitted.
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct AdjustStockRequest {
    pub delta: i64,
}

#[derive(Debug, Deserialize)]
pub struct ExpiringQuery {
    pub days: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct BarcodeRequest {
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct PurchaseRequest {
    #[serde(default = "default_true")]
    pub purchased: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct ClearGroceryQuery {
    pub purchased: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ExpenseReportQuery {
    pub budget_id: Option<BudgetId>,
}

#[derive(Debug, Deserialize)]
pub struct LedRequest {
    pub on: bool,
}

// -------------------------
// Response views
// -------------------------

/// Account as shown to clients (no password hash).
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: PrincipalId,
    pub household_id: HouseholdId,
    pub username: String,
    pub display_name: String,
    pub email: Option<String>,
    pub roles: Vec<Role>,
    pub created_at: DateTime<Utc>,
}

impl From<&UserAccount> for UserView {
    fn from(a: &UserAccount) -> Self {
        Self {
            id: a.id,
            household_id: a.household_id,
            username: a.username.clone(),
            display_name: a.display_name.clone(),
            email: a.email.clone(),
            roles: a.roles.clone(),
            created_at: a.created_at,
        }
    }
}

pub fn session_to_json(session: &Session) -> serde_json::Value {
    serde_json::json!({
        "token": session.token,
        "user": UserView::from(&session.account),
    })
}
