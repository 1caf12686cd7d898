//! Read-only views of the polled devices, plus LED control.
//!
//! Devices belong to the deployment, not to a household; any household with
//! `iot.read` sees the same list.

use std::sync::Arc;

use axum::{
    Router,
    extract::Extension,
    response::{IntoResponse, Response},
    routing::{get, post},
};

use homestock_auth::Permission;

use crate::app::extract::{Json, Path};
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz::authorize_request;
use crate::context::{HouseholdContext, PrincipalContext};

pub fn router() -> Router {
    Router::new()
        .route("/devices", get(list_devices))
        .route("/devices/:id", get(get_device))
        .route("/devices/:id/refresh", post(refresh_device))
        .route("/devices/:id/led", post(set_led))
}

pub async fn list_devices(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(household): Extension<HouseholdContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<Response, Response> {
    authorize_request(&household, &principal, &Permission::IOT_READ).map_err(errors::forbidden)?;
    Ok(Json(services.devices.statuses()).into_response())
}

pub async fn get_device(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(household): Extension<HouseholdContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, Response> {
    authorize_request(&household, &principal, &Permission::IOT_READ).map_err(errors::forbidden)?;
    let status = services.devices.status(&id).map_err(errors::device_error)?;
    Ok(Json(status).into_response())
}

/// Poll one device now; a failed read answers 502.
pub async fn refresh_device(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(household): Extension<HouseholdContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, Response> {
    authorize_request(&household, &principal, &Permission::IOT_READ).map_err(errors::forbidden)?;

    let outcome = services.devices.poll_one(&id).await.map_err(errors::device_error)?;
    if let Some(err) = outcome.error {
        return Err(errors::device_error(err));
    }
    if outcome.alarm_raised {
        services.publish_gas_alarm(&outcome.status);
    }
    Ok(Json(outcome.status).into_response())
}

pub async fn set_led(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(household): Extension<HouseholdContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::LedRequest>,
) -> Result<Response, Response> {
    authorize_request(&household, &principal, &Permission::IOT_CONTROL).map_err(errors::forbidden)?;

    let status = services
        .devices
        .set_led(&id, body.on)
        .await
        .map_err(errors::device_error)?;
    tracing::info!(household_id = %household.household_id(), device_id = %id, on = body.on, "led toggled by user");

    Ok(Json(status).into_response())
}
