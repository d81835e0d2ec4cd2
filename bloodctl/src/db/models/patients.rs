//! Database models for patient profiles.

use crate::types::{BloodType, PatientId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

/// Database request for creating a patient profile
#[derive(Debug, Clone)]
pub struct PatientCreateDBRequest {
    pub user_id: UserId,
    pub date_of_birth: Option<NaiveDate>,
    pub blood_type: Option<BloodType>,
    pub phone: Option<String>,
}

/// Database response for a patient profile
#[derive(Debug, Clone, FromRow)]
pub struct PatientDBResponse {
    pub id: PatientId,
    pub user_id: UserId,
    pub date_of_birth: Option<NaiveDate>,
    pub blood_type: Option<BloodType>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}
