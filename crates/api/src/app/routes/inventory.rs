use std::sync::Arc;

use axum::{
    Router,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};

use homestock_auth::Permission;
use homestock_infra::services::InventoryFilter;
use homestock_infra::services::inventory::DEFAULT_EXPIRY_WINDOW_DAYS;
use homestock_inventory::{InventoryItem, InventoryItemId, ItemPatch, NewItem, StatusChange};

use crate::app::extract::{Json, Path, Query};
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz::authorize_request;
use crate::context::{HouseholdContext, PrincipalContext};

pub fn router() -> Router {
    Router::new()
        .route("/items", get(list_items).post(create_item))
        .route("/items/:id", get(get_item).put(update_item).delete(delete_item))
        .route("/items/:id/adjust", post(adjust_stock))
        .route("/items/:id/acknowledge", post(acknowledge_alert))
        .route("/alerts", get(list_alerts))
        .route("/expiring", get(list_expiring))
}

fn saved(services: &AppServices, item: &InventoryItem, change: &StatusChange) {
    if change.alert_raised {
        services.publish_low_stock(item);
    }
}

pub async fn create_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(household): Extension<HouseholdContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<NewItem>,
) -> Result<Response, Response> {
    authorize_request(&household, &principal, &Permission::INVENTORY_WRITE).map_err(errors::forbidden)?;

    let (item, change) = services
        .inventory
        .create(household.household_id(), body)
        .await
        .map_err(errors::service_error)?;
    saved(&services, &item, &change);

    Ok((StatusCode::CREATED, Json(item)).into_response())
}

pub async fn list_items(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(household): Extension<HouseholdContext>,
    Extension(principal): Extension<PrincipalContext>,
    Query(filter): Query<InventoryFilter>,
) -> Result<Response, Response> {
    authorize_request(&household, &principal, &Permission::INVENTORY_READ).map_err(errors::forbidden)?;

    let items = services
        .inventory
        .list(household.household_id(), &filter)
        .await
        .map_err(errors::service_error)?;

    Ok(Json(items).into_response())
}

pub async fn get_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(household): Extension<HouseholdContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, Response> {
    authorize_request(&household, &principal, &Permission::INVENTORY_READ).map_err(errors::forbidden)?;
    let id: InventoryItemId = errors::parse_id(&id)?;

    let item = services
        .inventory
        .get(household.household_id(), id)
        .await
        .map_err(errors::service_error)?;

    Ok(Json(item).into_response())
}

pub async fn update_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(household): Extension<HouseholdContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(patch): Json<ItemPatch>,
) -> Result<Response, Response> {
    authorize_request(&household, &principal, &Permission::INVENTORY_WRITE).map_err(errors::forbidden)?;
    let id: InventoryItemId = errors::parse_id(&id)?;

    let (item, change) = services
        .inventory
        .update(household.household_id(), id, patch)
        .await
        .map_err(errors::service_error)?;
    saved(&services, &item, &change);

    Ok(Json(item).into_response())
}

pub async fn delete_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(household): Extension<HouseholdContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, Response> {
    authorize_request(&household, &principal, &Permission::INVENTORY_WRITE).map_err(errors::forbidden)?;
    let id: InventoryItemId = errors::parse_id(&id)?;

    services
        .inventory
        .delete(household.household_id(), id)
        .await
        .map_err(errors::service_error)?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

pub async fn adjust_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(household): Extension<HouseholdContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::AdjustStockRequest>,
) -> Result<Response, Response> {
    authorize_request(&household, &principal, &Permission::INVENTORY_WRITE).map_err(errors::forbidden)?;
    let id: InventoryItemId = errors::parse_id(&id)?;

    let (item, change) = services
        .inventory
        .adjust(household.household_id(), id, body.delta)
        .await
        .map_err(errors::service_error)?;
    saved(&services, &item, &change);

    Ok(Json(item).into_response())
}

pub async fn acknowledge_alert(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(household): Extension<HouseholdContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, Response> {
    authorize_request(&household, &principal, &Permission::INVENTORY_WRITE).map_err(errors::forbidden)?;
    let id: InventoryItemId = errors::parse_id(&id)?;

    let item = services
        .inventory
        .acknowledge(household.household_id(), id, principal.username())
        .await
        .map_err(errors::service_error)?;

    Ok(Json(item).into_response())
}

pub async fn list_alerts(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(household): Extension<HouseholdContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<Response, Response> {
    authorize_request(&household, &principal, &Permission::INVENTORY_READ).map_err(errors::forbidden)?;

    let items = services
        .inventory
        .alerts(household.household_id())
        .await
        .map_err(errors::service_error)?;

    Ok(Json(items).into_response())
}

pub async fn list_expiring(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(household): Extension<HouseholdContext>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<dto::ExpiringQuery>,
) -> Result<Response, Response> {
    authorize_request(&household, &principal, &Permission::INVENTORY_READ).map_err(errors::forbidden)?;

    let days = query.days.unwrap_or(DEFAULT_EXPIRY_WINDOW_DAYS);
    let items = services
        .inventory
        .expiring(household.household_id(), days)
        .await
        .map_err(errors::service_error)?;

    Ok(Json(items).into_response())
}
