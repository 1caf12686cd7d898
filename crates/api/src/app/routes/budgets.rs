//! Budgets, expenses, and summaries.

use std::sync::Arc;

use axum::{
    Router,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};

use homestock_auth::Permission;
use homestock_budgeting::{BudgetId, BudgetPatch, ExpenseId, ExpensePatch, NewBudget, NewExpense};
use homestock_infra::services::ExpenseFilter;

use crate::app::errors;
use crate::app::extract::{Json, Path, Query};
use crate::app::services::AppServices;
use crate::authz::authorize_request;
use crate::context::{HouseholdContext, PrincipalContext};

/// Mounted at the root: `/budgets/...` and `/expenses/...`.
pub fn router() -> Router {
    Router::new()
        .route("/budgets", get(list_budgets).post(create_budget))
        .route("/budgets/summary", get(all_summaries))
        .route(
            "/budgets/:id",
            get(get_budget).put(update_budget).delete(delete_budget),
        )
        .route("/budgets/:id/summary", get(budget_summary))
        .route("/expenses", get(list_expenses).post(create_expense))
        .route(
            "/expenses/:id",
            get(get_expense).put(update_expense).delete(delete_expense),
        )
}

pub async fn create_budget(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(household): Extension<HouseholdContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<NewBudget>,
) -> Result<Response, Response> {
    authorize_request(&household, &principal, &Permission::BUDGET_WRITE).map_err(errors::forbidden)?;

    let budget = services
        .budgets
        .create_budget(household.household_id(), body)
        .await
        .map_err(errors::service_error)?;

    Ok((StatusCode::CREATED, Json(budget)).into_response())
}

pub async fn list_budgets(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(household): Extension<HouseholdContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<Response, Response> {
    authorize_request(&household, &principal, &Permission::BUDGET_READ).map_err(errors::forbidden)?;

    let budgets = services
        .budgets
        .list_budgets(household.household_id())
        .await
        .map_err(errors::service_error)?;

    Ok(Json(budgets).into_response())
}

pub async fn get_budget(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(household): Extension<HouseholdContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, Response> {
    authorize_request(&household, &principal, &Permission::BUDGET_READ).map_err(errors::forbidden)?;
    let id: BudgetId = errors::parse_id(&id)?;

    let budget = services
        .budgets
        .get_budget(household.household_id(), id)
        .await
        .map_err(errors::service_error)?;

    Ok(Json(budget).into_response())
}

pub async fn update_budget(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(household): Extension<HouseholdContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(patch): Json<BudgetPatch>,
) -> Result<Response, Response> {
    authorize_request(&household, &principal, &Permission::BUDGET_WRITE).map_err(errors::forbidden)?;
    let id: BudgetId = errors::parse_id(&id)?;

    let budget = services
        .budgets
        .update_budget(household.household_id(), id, patch)
        .await
        .map_err(errors::service_error)?;

    Ok(Json(budget).into_response())
}

pub async fn delete_budget(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(household): Extension<HouseholdContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, Response> {
    authorize_request(&household, &principal, &Permission::BUDGET_WRITE).map_err(errors::forbidden)?;
    let id: BudgetId = errors::parse_id(&id)?;

    let removed = services
        .budgets
        .delete_budget(household.household_id(), id)
        .await
        .map_err(errors::service_error)?;

    Ok(Json(serde_json::json!({ "expenses_removed": removed })).into_response())
}

pub async fn budget_summary(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(household): Extension<HouseholdContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, Response> {
    authorize_request(&household, &principal, &Permission::BUDGET_READ).map_err(errors::forbidden)?;
    let id: BudgetId = errors::parse_id(&id)?;

    let summary = services
        .budgets
        .summary(household.household_id(), id)
        .await
        .map_err(errors::service_error)?;

    Ok(Json(summary).into_response())
}

pub async fn all_summaries(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(household): Extension<HouseholdContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<Response, Response> {
    authorize_request(&household, &principal, &Permission::BUDGET_READ).map_err(errors::forbidden)?;

    let summaries = services
        .budgets
        .summaries(household.household_id())
        .await
        .map_err(errors::service_error)?;

    Ok(Json(summaries).into_response())
}

pub async fn create_expense(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(household): Extension<HouseholdContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<NewExpense>,
) -> Result<Response, Response> {
    authorize_request(&household, &principal, &Permission::BUDGET_WRITE).map_err(errors::forbidden)?;

    let expense = services
        .budgets
        .create_expense(household.household_id(), body)
        .await
        .map_err(errors::service_error)?;

    Ok((StatusCode::CREATED, Json(expense)).into_response())
}

pub async fn list_expenses(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(household): Extension<HouseholdContext>,
    Extension(principal): Extension<PrincipalContext>,
    Query(filter): Query<ExpenseFilter>,
) -> Result<Response, Response> {
    authorize_request(&household, &principal, &Permission::BUDGET_READ).map_err(errors::forbidden)?;

    let expenses = services
        .budgets
        .list_expenses(household.household_id(), &filter)
        .await
        .map_err(errors::service_error)?;

    Ok(Json(expenses).into_response())
}

pub async fn get_expense(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(household): Extension<HouseholdContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, Response> {
    authorize_request(&household, &principal, &Permission::BUDGET_READ).map_err(errors::forbidden)?;
    let id: ExpenseId = errors::parse_id(&id)?;

    let expense = services
        .budgets
        .get_expense(household.household_id(), id)
        .await
        .map_err(errors::service_error)?;

    Ok(Json(expense).into_response())
}

pub async fn update_expense(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(household): Extension<HouseholdContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(patch): Json<ExpensePatch>,
) -> Result<Response, Response> {
    authorize_request(&household, &principal, &Permission::BUDGET_WRITE).map_err(errors::forbidden)?;
    let id: ExpenseId = errors::parse_id(&id)?;

    let expense = services
        .budgets
        .update_expense(household.household_id(), id, patch)
        .await
        .map_err(errors::service_error)?;

    Ok(Json(expense).into_response())
}

pub async fn delete_expense(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(household): Extension<HouseholdContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, Response> {
    authorize_request(&household, &principal, &Permission::BUDGET_WRITE).map_err(errors::forbidden)?;
    let id: ExpenseId = errors::parse_id(&id)?;

    services
        .budgets
        .delete_expense(household.household_id(), id)
        .await
        .map_err(errors::service_error)?;

    Ok(StatusCode::NO_CONTENT.into_response())
}
