//! Best-effort activity log.
//!
//! Same failure policy as notifications: the write happens after the owning
//! transaction commits, on its own connection, and a failure is logged at
//! warn without failing the request.

use sqlx::PgPool;

use crate::db::handlers::ActivityLogs;
use crate::db::models::activity_logs::ActivityLogCreateDBRequest;
use crate::types::UserId;

/// Record an activity-log entry. Returns immediately; the insert runs in a
/// spawned task.
pub fn record(
    db: &PgPool,
    user_id: Option<UserId>,
    action: impl Into<String>,
    entity_type: impl Into<String>,
    entity_id: Option<String>,
    old_values: Option<serde_json::Value>,
    new_values: Option<serde_json::Value>,
) {
    let db = db.clone();
    let request = ActivityLogCreateDBRequest {
        user_id,
        action: action.into(),
        entity_type: entity_type.into(),
        entity_id,
        old_values,
        new_values,
    };

    tokio::spawn(async move {
        let mut conn = match db.acquire().await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::warn!(action = %request.action, error = %e, "Failed to acquire connection for activity log");
                return;
            }
        };

        let mut repo = ActivityLogs::new(&mut conn);
        if let Err(e) = repo.create(&request).await {
            tracing::warn!(action = %request.action, entity_type = %request.entity_type, error = %e, "Failed to record activity log entry");
        }
    });
}
