//! The current user's in-app notifications.

use axum::{
    Json,
    extract::{Path, Query, State},
};

use crate::{
    AppState,
    api::models::{notifications::NotificationResponse, pagination::Pagination, users::CurrentUser},
    db::handlers::Notifications,
    errors::Error,
    types::NotificationId,
};

/// List the authenticated user's notifications, newest first
#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    tag = "notifications",
    params(Pagination),
    responses(
        (status = 200, description = "Notifications for the current user", body = Vec<NotificationResponse>),
        (status = 401, description = "Not authenticated"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_notifications(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Vec<NotificationResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Notifications::new(&mut conn);

    let (skip, limit) = pagination.params();
    let notifications = repo.list_for_user(current_user.id, skip, limit).await?;

    Ok(Json(notifications.into_iter().map(NotificationResponse::from).collect()))
}

/// Mark one of the user's notifications as read
#[utoipa::path(
    post,
    path = "/api/v1/notifications/{id}/read",
    tag = "notifications",
    params(("id" = String, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Notification marked read", body = NotificationResponse),
        (status = 404, description = "Notification not found"),
    )
)]
#[tracing::instrument(skip_all, fields(notification_id = %id))]
pub async fn mark_notification_read(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<NotificationId>,
) -> Result<Json<NotificationResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Notifications::new(&mut conn);

    let notification = repo.mark_read(id, current_user.id).await?.ok_or_else(|| Error::NotFound {
        resource: "notification".to_string(),
        id: id.to_string(),
    })?;

    Ok(Json(NotificationResponse::from(notification)))
}
