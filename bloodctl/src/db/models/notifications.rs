//! Database models for in-app notifications.

use crate::types::{NotificationId, NotificationPriority, UserId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database request for creating a notification
#[derive(Debug, Clone)]
pub struct NotificationCreateDBRequest {
    pub user_id: UserId,
    pub title: String,
    pub body: String,
    pub priority: NotificationPriority,
}

/// Database response for a notification
#[derive(Debug, Clone, FromRow)]
pub struct NotificationDBResponse {
    pub id: NotificationId,
    pub user_id: UserId,
    pub title: String,
    pub body: String,
    pub priority: NotificationPriority,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}
