//! Fire-and-forget in-app notification delivery.
//!
//! Notifications are a side effect of committed operations: they run on their
//! own connection after the owning transaction commits, and a failure is
//! logged at warn without failing the request that triggered it.

use sqlx::PgPool;

use crate::db::handlers::Notifications;
use crate::db::models::notifications::NotificationCreateDBRequest;
use crate::types::{NotificationPriority, UserId, abbrev_uuid};

/// Queue a notification for delivery. Returns immediately; the insert runs in
/// a spawned task.
pub fn notify(db: &PgPool, user_id: UserId, title: impl Into<String>, body: impl Into<String>, priority: NotificationPriority) {
    let db = db.clone();
    let request = NotificationCreateDBRequest {
        user_id,
        title: title.into(),
        body: body.into(),
        priority,
    };

    tokio::spawn(async move {
        let mut conn = match db.acquire().await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::warn!(user_id = %abbrev_uuid(&request.user_id), error = %e, "Failed to acquire connection for notification");
                return;
            }
        };

        let mut repo = Notifications::new(&mut conn);
        if let Err(e) = repo.create(&request).await {
            tracing::warn!(
                user_id = %abbrev_uuid(&request.user_id),
                title = %request.title,
                error = %e,
                "Failed to deliver notification"
            );
        }
    });
}
