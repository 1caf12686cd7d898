use std::sync::Arc;

use axum::{
    Router,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};

use homestock_auth::Permission;
use homestock_inventory::BarcodeId;

use crate::app::extract::{Json, Path};
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz::authorize_request;
use crate::context::{HouseholdContext, PrincipalContext};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_barcodes).post(create_barcode))
        .route("/decode", post(decode_barcode))
        .route("/:id", get(get_barcode).delete(delete_barcode))
}

pub async fn create_barcode(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(household): Extension<HouseholdContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::BarcodeRequest>,
) -> Result<Response, Response> {
    authorize_request(&household, &principal, &Permission::BARCODE_WRITE).map_err(errors::forbidden)?;

    let record = services
        .barcodes
        .create(household.household_id(), &body.code)
        .await
        .map_err(errors::service_error)?;

    Ok((StatusCode::CREATED, Json(record)).into_response())
}

pub async fn list_barcodes(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(household): Extension<HouseholdContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<Response, Response> {
    authorize_request(&household, &principal, &Permission::BARCODE_READ).map_err(errors::forbidden)?;

    let records = services
        .barcodes
        .list(household.household_id())
        .await
        .map_err(errors::service_error)?;

    Ok(Json(records).into_response())
}

pub async fn get_barcode(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(household): Extension<HouseholdContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, Response> {
    authorize_request(&household, &principal, &Permission::BARCODE_READ).map_err(errors::forbidden)?;
    let id: BarcodeId = errors::parse_id(&id)?;

    let record = services
        .barcodes
        .get(household.household_id(), id)
        .await
        .map_err(errors::service_error)?;

    Ok(Json(record).into_response())
}

pub async fn delete_barcode(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(household): Extension<HouseholdContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, Response> {
    authorize_request(&household, &principal, &Permission::BARCODE_WRITE).map_err(errors::forbidden)?;
    let id: BarcodeId = errors::parse_id(&id)?;

    services
        .barcodes
        .delete(household.household_id(), id)
        .await
        .map_err(errors::service_error)?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

/// Decode only; nothing is stored.
pub async fn decode_barcode(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(household): Extension<HouseholdContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::BarcodeRequest>,
) -> Result<Response, Response> {
    authorize_request(&household, &principal, &Permission::BARCODE_READ).map_err(errors::forbidden)?;

    let decoded = services.barcodes.decode(&body.code).map_err(errors::service_error)?;
    Ok(Json(decoded).into_response())
}
