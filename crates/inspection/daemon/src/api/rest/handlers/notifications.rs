//! Notification inbox handlers

use crate::api::rest::extract::CurrentUser;
use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use crate::notifications::NotificationView;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

/// List notifications query params
#[derive(Debug, Default, Deserialize)]
pub struct ListNotificationsQuery {
    #[serde(default, alias = "no_leidas")]
    pub unread_only: bool,
}

/// Notifications for the caller, newest first
pub async fn list_notifications(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<ListNotificationsQuery>,
) -> Json<Vec<NotificationView>> {
    Json(
        state
            .notifications
            .list(&current.caller, query.unread_only)
            .await,
    )
}

/// Mark one notification read
pub async fn mark_notification_read(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = Uuid::parse_str(&id)
        .map_err(|_| ApiError::BadRequest(format!("Invalid notification ID: {}", id)))?;
    if state.notifications.mark_read(&current.caller, &id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("notification {id}")))
    }
}
