//! Database models for blood requests.

use crate::types::{BloodRequestId, BloodType, HospitalId, PatientId, Priority, RequestStatus};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database request for creating a blood request
#[derive(Debug, Clone)]
pub struct BloodRequestCreateDBRequest {
    pub request_code: String,
    pub patient_id: PatientId,
    pub hospital_id: HospitalId,
    pub blood_type: BloodType,
    pub units_requested: i32,
    pub priority: Priority,
    pub notes: Option<String>,
}

/// Database response for a blood request
#[derive(Debug, Clone, FromRow)]
pub struct BloodRequestDBResponse {
    pub id: BloodRequestId,
    pub request_code: String,
    pub patient_id: PatientId,
    pub hospital_id: HospitalId,
    pub blood_type: BloodType,
    pub units_requested: i32,
    pub priority: Priority,
    pub status: RequestStatus,
    pub notes: Option<String>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
