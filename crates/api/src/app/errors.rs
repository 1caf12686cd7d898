use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use homestock_auth::AuthzError;
use homestock_core::DomainError;
use homestock_infra::ServiceError;
use homestock_iot::DeviceError;

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn domain_error(err: DomainError) -> Response {
    let message = err.to_string();
    match err {
        DomainError::Validation(_) => json_error(StatusCode::BAD_REQUEST, "validation_error", message),
        DomainError::InvalidId(_) => json_error(StatusCode::BAD_REQUEST, "invalid_id", message),
        DomainError::InvariantViolation(_) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", message)
        }
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", message),
        DomainError::Conflict(_) => json_error(StatusCode::CONFLICT, "conflict", message),
        DomainError::Unauthorized => json_error(StatusCode::UNAUTHORIZED, "unauthorized", message),
    }
}

pub fn service_error(err: ServiceError) -> Response {
    match err {
        ServiceError::Domain(e) => domain_error(e),
        ServiceError::InvalidCredentials => {
            json_error(StatusCode::UNAUTHORIZED, "invalid_credentials", err.to_string())
        }
        ServiceError::Store(e) => {
            tracing::error!(error = %e, "store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string())
        }
        other => {
            tracing::error!(error = %other, "request failed");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", other.to_string())
        }
    }
}

pub fn device_error(err: DeviceError) -> Response {
    match err {
        DeviceError::UnknownDevice(_) => json_error(StatusCode::NOT_FOUND, "not_found", err.to_string()),
        DeviceError::Config(_) => json_error(StatusCode::INTERNAL_SERVER_ERROR, "device_config", err.to_string()),
        other => json_error(StatusCode::BAD_GATEWAY, "device_unavailable", other.to_string()),
    }
}

pub fn forbidden(err: AuthzError) -> Response {
    json_error(StatusCode::FORBIDDEN, "forbidden", err.to_string())
}

/// Parse a path id; malformed ids answer 400.
pub fn parse_id<T>(raw: &str) -> Result<T, Response>
where
    T: core::str::FromStr<Err = DomainError>,
{
    raw.parse().map_err(domain_error)
}
