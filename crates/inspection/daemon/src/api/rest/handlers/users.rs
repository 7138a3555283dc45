//! User account handlers

use crate::api::rest::extract::{parse_id, ApiJson, CurrentUser};
use crate::api::rest::state::AppState;
use crate::error::ApiResult;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use inspection_engine::{NewUser, UserUpdate};
use inspection_types::{User, UserId, UserStatus};
use serde::Deserialize;

/// List users query params
#[derive(Debug, Default, Deserialize)]
pub struct ListUsersQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

/// Activate or deactivate an account
#[derive(Debug, Deserialize)]
pub struct UserStatusRequest {
    #[serde(alias = "status")]
    pub estado: UserStatus,
}

/// List user accounts
pub async fn list_users(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<ListUsersQuery>,
) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(
        state
            .catalog
            .list_users(&current.caller, query.include_inactive)
            .await?,
    ))
}

/// Create a user account
pub async fn create_user(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiJson(input): ApiJson<NewUser>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = state.catalog.create_user(&current.caller, input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Update name, email or role
pub async fn update_user(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<UserUpdate>,
) -> ApiResult<Json<User>> {
    let id: UserId = parse_id(&id)?;
    Ok(Json(
        state.catalog.update_user(&current.caller, &id, input).await?,
    ))
}

/// Activate or deactivate an account
pub async fn set_user_status(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UserStatusRequest>,
) -> ApiResult<Json<User>> {
    let id: UserId = parse_id(&id)?;
    Ok(Json(
        state
            .catalog
            .set_user_status(&current.caller, &id, request.estado)
            .await?,
    ))
}

/// Delete an account with no inspections
pub async fn delete_user(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id: UserId = parse_id(&id)?;
    state.catalog.delete_user(&current.caller, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
