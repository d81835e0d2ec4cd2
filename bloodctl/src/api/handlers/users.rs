//! Admin user directory.

use axum::{
    Json,
    extract::{Query, State},
};

use crate::{
    AppState,
    api::models::{
        pagination::Pagination,
        users::{CurrentUser, ListUsersQuery, UserResponse},
    },
    auth::current_user::require_admin,
    db::handlers::{Repository, Users, users::UserFilter},
    errors::Error,
};

/// List user accounts, optionally filtered by role (admin only)
#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "users",
    params(ListUsersQuery, Pagination),
    responses(
        (status = 200, description = "User accounts, newest first", body = Vec<UserResponse>),
        (status = 403, description = "Not an admin"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_users(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ListUsersQuery>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Vec<UserResponse>>, Error> {
    require_admin(&current_user, "user directory")?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Users::new(&mut conn);

    let (skip, limit) = pagination.params();
    let filter = UserFilter {
        role: query.role,
        ..UserFilter::new(skip, limit)
    };
    let users = repo.list(&filter).await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}
