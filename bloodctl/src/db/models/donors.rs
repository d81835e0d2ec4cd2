//! Database models for donor profiles.

use crate::types::{BloodType, DonorId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

/// Database request for creating a donor profile
#[derive(Debug, Clone)]
pub struct DonorCreateDBRequest {
    pub user_id: UserId,
    pub blood_type: BloodType,
    pub date_of_birth: Option<NaiveDate>,
    pub weight_kg: Option<i32>,
}

/// Database response for a donor profile
#[derive(Debug, Clone, FromRow)]
pub struct DonorDBResponse {
    pub id: DonorId,
    pub user_id: UserId,
    pub blood_type: BloodType,
    pub date_of_birth: Option<NaiveDate>,
    pub weight_kg: Option<i32>,
    pub is_eligible: bool,
    pub last_donation_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}
