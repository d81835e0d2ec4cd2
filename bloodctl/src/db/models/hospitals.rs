//! Database models for hospital profiles.

use crate::types::{HospitalId, UserId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database request for creating a hospital profile
#[derive(Debug, Clone)]
pub struct HospitalCreateDBRequest {
    pub user_id: UserId,
    pub name: String,
    pub address: String,
    pub city: String,
    pub phone: Option<String>,
    pub license_number: String,
}

/// Database response for a hospital profile
#[derive(Debug, Clone, FromRow)]
pub struct HospitalDBResponse {
    pub id: HospitalId,
    pub user_id: UserId,
    pub name: String,
    pub address: String,
    pub city: String,
    pub phone: Option<String>,
    pub license_number: String,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
