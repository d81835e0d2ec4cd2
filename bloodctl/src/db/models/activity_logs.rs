//! Database models for the activity log.

use crate::types::UserId;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database request for recording an activity log entry
#[derive(Debug, Clone)]
pub struct ActivityLogCreateDBRequest {
    pub user_id: Option<UserId>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<String>,
    pub old_values: Option<serde_json::Value>,
    pub new_values: Option<serde_json::Value>,
}

/// Database response for an activity log entry
#[derive(Debug, Clone, FromRow)]
pub struct ActivityLogDBResponse {
    pub id: Uuid,
    pub user_id: Option<UserId>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<String>,
    pub old_values: Option<serde_json::Value>,
    pub new_values: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}
