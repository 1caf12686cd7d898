use std::sync::Arc;

use axum::{
    Router,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};

use homestock_auth::Permission;
use homestock_grocery::{GroceryItemId, GroceryPatch, NewGroceryItem};
use homestock_infra::services::GroceryFilter;

use crate::app::extract::{Json, Path, Query};
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz::authorize_request;
use crate::context::{HouseholdContext, PrincipalContext};

pub fn router() -> Router {
    Router::new()
        .route(
            "/items",
            get(list_items).post(create_item).delete(clear_purchased),
        )
        .route("/items/:id", get(get_item).put(update_item).delete(delete_item))
        .route("/items/:id/purchase", post(set_purchased))
        .route("/restock", post(restock))
}

pub async fn create_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(household): Extension<HouseholdContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<NewGroceryItem>,
) -> Result<Response, Response> {
    authorize_request(&household, &principal, &Permission::GROCERY_WRITE).map_err(errors::forbidden)?;

    let item = services
        .grocery
        .create(household.household_id(), body)
        .await
        .map_err(errors::service_error)?;

    Ok((StatusCode::CREATED, Json(item)).into_response())
}

pub async fn list_items(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(household): Extension<HouseholdContext>,
    Extension(principal): Extension<PrincipalContext>,
    Query(filter): Query<GroceryFilter>,
) -> Result<Response, Response> {
    authorize_request(&household, &principal, &Permission::GROCERY_READ).map_err(errors::forbidden)?;

    let items = services
        .grocery
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
    authorize_request(&household, &principal, &Permission::GROCERY_READ).map_err(errors::forbidden)?;
    let id: GroceryItemId = errors::parse_id(&id)?;

    let item = services
        .grocery
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
    Json(patch): Json<GroceryPatch>,
) -> Result<Response, Response> {
    authorize_request(&household, &principal, &Permission::GROCERY_WRITE).map_err(errors::forbidden)?;
    let id: GroceryItemId = errors::parse_id(&id)?;

    let item = services
        .grocery
        .update(household.household_id(), id, patch)
        .await
        .map_err(errors::service_error)?;

    Ok(Json(item).into_response())
}

pub async fn delete_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(household): Extension<HouseholdContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, Response> {
    authorize_request(&household, &principal, &Permission::GROCERY_WRITE).map_err(errors::forbidden)?;
    let id: GroceryItemId = errors::parse_id(&id)?;

    services
        .grocery
        .delete(household.household_id(), id)
        .await
        .map_err(errors::service_error)?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

pub async fn set_purchased(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(household): Extension<HouseholdContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::PurchaseRequest>,
) -> Result<Response, Response> {
    authorize_request(&household, &principal, &Permission::GROCERY_WRITE).map_err(errors::forbidden)?;
    let id: GroceryItemId = errors::parse_id(&id)?;

    let item = services
        .grocery
        .set_purchased(household.household_id(), id, body.purchased)
        .await
        .map_err(errors::service_error)?;

    Ok(Json(item).into_response())
}

/// `DELETE /grocery/items?purchased=true`; refuses to wipe the whole list.
pub async fn clear_purchased(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(household): Extension<HouseholdContext>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<dto::ClearGroceryQuery>,
) -> Result<Response, Response> {
    authorize_request(&household, &principal, &Permission::GROCERY_WRITE).map_err(errors::forbidden)?;
    if query.purchased != Some(true) {
        return Err(errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "only purchased entries can be cleared; pass ?purchased=true",
        ));
    }

    let removed = services
        .grocery
        .clear_purchased(household.household_id())
        .await
        .map_err(errors::service_error)?;

    Ok(Json(serde_json::json!({ "removed": removed })).into_response())
}

pub async fn restock(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(household): Extension<HouseholdContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<Response, Response> {
    authorize_request(&household, &principal, &Permission::GROCERY_WRITE).map_err(errors::forbidden)?;

    let added = services
        .grocery
        .restock(household.household_id())
        .await
        .map_err(errors::service_error)?;

    Ok((StatusCode::CREATED, Json(added)).into_response())
}
