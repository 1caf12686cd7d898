//! CSV exports, served as file downloads.

use std::sync::Arc;

use axum::{
    Router,
    extract::Extension,
    http::header,
    response::{IntoResponse, Response},
    routing::get,
};

use homestock_auth::Permission;
use homestock_infra::ServiceError;
use homestock_infra::export::{self, ExportError};
use homestock_infra::services::{ExpenseFilter, InventoryFilter};

use crate::app::extract::Query;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz::authorize_request;
use crate::context::{HouseholdContext, PrincipalContext};

pub fn router() -> Router {
    Router::new()
        .route("/inventory.csv", get(inventory_report))
        .route("/expenses.csv", get(expenses_report))
        .route("/budgets.csv", get(budgets_report))
}

fn csv_attachment(filename: &'static str, body: Result<String, ExportError>) -> Result<Response, Response> {
    let body = body.map_err(|e| errors::service_error(ServiceError::from(e)))?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response())
}

pub async fn inventory_report(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(household): Extension<HouseholdContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<Response, Response> {
    authorize_request(&household, &principal, &Permission::REPORTS_READ).map_err(errors::forbidden)?;

    let items = services
        .inventory
        .list(household.household_id(), &InventoryFilter::default())
        .await
        .map_err(errors::service_error)?;

    csv_attachment("inventory.csv", export::inventory_csv(&items))
}

pub async fn expenses_report(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(household): Extension<HouseholdContext>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<dto::ExpenseReportQuery>,
) -> Result<Response, Response> {
    authorize_request(&household, &principal, &Permission::REPORTS_READ).map_err(errors::forbidden)?;

    let filter = ExpenseFilter {
        budget_id: query.budget_id,
        ..ExpenseFilter::default()
    };
    let expenses = services
        .budgets
        .list_expenses(household.household_id(), &filter)
        .await
        .map_err(errors::service_error)?;
    let budgets = services
        .budgets
        .list_budgets(household.household_id())
        .await
        .map_err(errors::service_error)?;

    csv_attachment("expenses.csv", export::expenses_csv(&expenses, &budgets))
}

pub async fn budgets_report(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(household): Extension<HouseholdContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<Response, Response> {
    authorize_request(&household, &principal, &Permission::REPORTS_READ).map_err(errors::forbidden)?;

    let summaries = services
        .budgets
        .summaries(household.household_id())
        .await
        .map_err(errors::service_error)?;

    csv_attachment("budgets.csv", export::budgets_csv(&summaries))
}
