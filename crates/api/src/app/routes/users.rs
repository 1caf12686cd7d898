//! Registration, login, and household membership.

use std::sync::Arc;

use axum::{
    Router,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};

use homestock_auth::{NewAccount, Permission, PrincipalId, Role};

use crate::app::dto::{self, UserView};
use crate::app::errors;
use crate::app::extract::{Json, Path};
use crate::app::services::AppServices;
use crate::authz::authorize_request;
use crate::context::{HouseholdContext, PrincipalContext};

/// Unauthenticated endpoints, mounted under `/auth`.
pub fn public_router() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_users).post(add_user))
        .route("/me/password", put(change_password))
        .route("/:id", delete(remove_user))
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::RegisterRequest>,
) -> Result<Response, Response> {
    let input = NewAccount {
        username: body.username,
        display_name: body.display_name,
        email: body.email,
    };
    let session = services
        .accounts
        .register(input, &body.password)
        .await
        .map_err(errors::service_error)?;

    Ok((StatusCode::CREATED, Json(dto::session_to_json(&session))).into_response())
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::LoginRequest>,
) -> Result<Response, Response> {
    let session = services
        .accounts
        .login(&body.username, &body.password)
        .await
        .map_err(errors::service_error)?;

    Ok(Json(dto::session_to_json(&session)).into_response())
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(household): Extension<HouseholdContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<Response, Response> {
    authorize_request(&household, &principal, &Permission::USERS_READ).map_err(errors::forbidden)?;

    let users: Vec<UserView> = services
        .accounts
        .list_members(household.household_id())
        .await
        .map_err(errors::service_error)?
        .iter()
        .map(UserView::from)
        .collect();

    Ok(Json(users).into_response())
}

pub async fn add_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(household): Extension<HouseholdContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::AddMemberRequest>,
) -> Result<Response, Response> {
    authorize_request(&household, &principal, &Permission::USERS_MANAGE).map_err(errors::forbidden)?;

    let role = match body.role.as_deref().map(str::trim) {
        None | Some("") => Role::MEMBER,
        Some(name) => Role::new(name.to_lowercase()),
    };
    let input = NewAccount {
        username: body.username,
        display_name: body.display_name,
        email: body.email,
    };
    let account = services
        .accounts
        .add_member(household.household_id(), input, &body.password, role)
        .await
        .map_err(errors::service_error)?;

    Ok((StatusCode::CREATED, Json(UserView::from(&account))).into_response())
}

pub async fn remove_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(household): Extension<HouseholdContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, Response> {
    authorize_request(&household, &principal, &Permission::USERS_MANAGE).map_err(errors::forbidden)?;
    let id: PrincipalId = errors::parse_id(&id)?;

    services
        .accounts
        .remove_member(household.household_id(), principal.principal_id(), id)
        .await
        .map_err(errors::service_error)?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

/// Any signed-in user may change their own password.
pub async fn change_password(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(household): Extension<HouseholdContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::ChangePasswordRequest>,
) -> Result<Response, Response> {
    services
        .accounts
        .change_password(
            household.household_id(),
            principal.principal_id(),
            &body.current_password,
            &body.new_password,
        )
        .await
        .map_err(errors::service_error)?;

    Ok(StatusCode::NO_CONTENT.into_response())
}
