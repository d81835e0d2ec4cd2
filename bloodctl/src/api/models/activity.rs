//! API models for the activity log.

use crate::db::models::activity_logs::ActivityLogDBResponse;
use crate::types::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ActivityLogResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: Uuid,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub user_id: Option<UserId>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<String>,
    pub old_values: Option<serde_json::Value>,
    pub new_values: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl From<ActivityLogDBResponse> for ActivityLogResponse {
    fn from(db: ActivityLogDBResponse) -> Self {
        Self {
            id: db.id,
            user_id: db.user_id,
            action: db.action,
            entity_type: db.entity_type,
            entity_id: db.entity_id,
            old_values: db.old_values,
            new_values: db.new_values,
            created_at: db.created_at,
        }
    }
}
