use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use homestock_auth::JwtValidator;

use crate::app::errors::json_error;
use crate::context::{HouseholdContext, PrincipalContext};

#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<dyn JwtValidator>,
}

pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let token = extract_bearer(req.headers()).map_err(unauthorized)?;

    let claims = state.jwt.validate(token, Utc::now()).map_err(|e| {
        tracing::debug!(error = %e, "rejected bearer token");
        unauthorized("invalid or expired token")
    })?;

    req.extensions_mut()
        .insert(HouseholdContext::new(claims.household_id));
    req.extensions_mut().insert(PrincipalContext::new(
        claims.sub,
        claims.username,
        claims.roles,
    ));

    Ok(next.run(req).await)
}

fn unauthorized(message: &str) -> Response {
    json_error(StatusCode::UNAUTHORIZED, "unauthorized", message)
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, &'static str> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or("missing bearer token")?;

    let header = header.to_str().map_err(|_| "malformed authorization header")?;

    let header = header
        .strip_prefix("Bearer ")
        .ok_or("authorization header is not a bearer token")?;

    let token = header.trim();
    if token.is_empty() {
        return Err("empty bearer token");
    }

    Ok(token)
}
