//! Database repository for the activity log.

use crate::db::errors::Result;
use crate::db::models::activity_logs::{ActivityLogCreateDBRequest, ActivityLogDBResponse};
use sqlx::PgConnection;
use tracing::instrument;

pub struct ActivityLogs<'c> {
    db: &'c mut PgConnection,
}

impl<'c> ActivityLogs<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(action = %request.action, entity_type = %request.entity_type), err)]
    pub async fn create(&mut self, request: &ActivityLogCreateDBRequest) -> Result<ActivityLogDBResponse> {
        let entry = sqlx::query_as::<_, ActivityLogDBResponse>(
            r#"
            INSERT INTO activity_logs (user_id, action, entity_type, entity_id, old_values, new_values)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(request.user_id)
        .bind(&request.action)
        .bind(&request.entity_type)
        .bind(&request.entity_id)
        .bind(&request.old_values)
        .bind(&request.new_values)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(entry)
    }

    #[instrument(skip(self), err)]
    pub async fn list_recent(&mut self, skip: i64, limit: i64) -> Result<Vec<ActivityLogDBResponse>> {
        let entries = sqlx::query_as::<_, ActivityLogDBResponse>(
            "SELECT * FROM activity_logs ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(skip)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(entries)
    }
}
