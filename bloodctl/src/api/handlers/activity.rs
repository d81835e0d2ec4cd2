//! Admin view of the activity log.

use axum::{
    Json,
    extract::{Query, State},
};

use crate::{
    AppState,
    api::models::{activity::ActivityLogResponse, pagination::Pagination, users::CurrentUser},
    auth::current_user::require_admin,
    db::handlers::ActivityLogs,
    errors::Error,
};

/// List recent activity-log entries (admin only)
#[utoipa::path(
    get,
    path = "/api/v1/activity",
    tag = "activity",
    params(Pagination),
    responses(
        (status = 200, description = "Recent activity, newest first", body = Vec<ActivityLogResponse>),
        (status = 403, description = "Not an admin"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_activity(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Vec<ActivityLogResponse>>, Error> {
    require_admin(&current_user, "activity log")?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = ActivityLogs::new(&mut conn);

    let (skip, limit) = pagination.params();
    let entries = repo.list_recent(skip, limit).await?;

    Ok(Json(entries.into_iter().map(ActivityLogResponse::from).collect()))
}
