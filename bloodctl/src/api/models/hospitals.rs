//! API response models for hospitals.

use crate::db::models::hospitals::HospitalDBResponse;
use crate::types::{HospitalId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HospitalResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: HospitalId,
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    pub name: String,
    pub address: String,
    pub city: String,
    pub phone: Option<String>,
    pub license_number: String,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl From<HospitalDBResponse> for HospitalResponse {
    fn from(db: HospitalDBResponse) -> Self {
        Self {
            id: db.id,
            user_id: db.user_id,
            name: db.name,
            address: db.address,
            city: db.city,
            phone: db.phone,
            license_number: db.license_number,
            is_verified: db.is_verified,
            created_at: db.created_at,
        }
    }
}
