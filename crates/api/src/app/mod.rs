//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: stores, domain services, device hub, realtime channel
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request DTOs and JSON views
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use anyhow::Context;
use axum::{Extension, Router, http::StatusCode, response::Response, routing::get};
use tower::ServiceBuilder;

use homestock_auth::Hs256Jwt;
use homestock_infra::AppConfig;
use homestock_iot::{DeviceClient, HttpDeviceClient};

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod extract;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(config: AppConfig) -> anyhow::Result<Router> {
    let client = HttpDeviceClient::new(config.device_timeout).context("failed to build device client")?;
    build_app_with_devices(config, Arc::new(client)).await
}

/// Same router, with the device transport supplied by the caller.
pub async fn build_app_with_devices(
    config: AppConfig,
    device_client: Arc<dyn DeviceClient>,
) -> anyhow::Result<Router> {
    let jwt = Arc::new(Hs256Jwt::new(config.jwt_secret.as_bytes()));
    let auth_state = middleware::AuthState { jwt: jwt.clone() };

    let services = Arc::new(services::build_services(&config, jwt, device_client).await?);

    // Protected routes: require a valid token (household + roles).
    let protected = routes::router().layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    Ok(Router::new()
        .route("/health", get(routes::system::health))
        .nest("/auth", routes::users::public_router())
        .merge(protected)
        .fallback(unknown_route)
        .layer(ServiceBuilder::new().layer(Extension(services))))
}

async fn unknown_route() -> Response {
    errors::json_error(StatusCode::NOT_FOUND, "not_found", "no such route")
}
