//! API models for blood requests.

use crate::db::models::blood_requests::BloodRequestDBResponse;
use crate::types::{BloodRequestId, BloodType, HospitalId, PatientId, Priority, RequestStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Bounds on how many units one request may ask for.
pub const MIN_UNITS_PER_REQUEST: i32 = 1;
pub const MAX_UNITS_PER_REQUEST: i32 = 10;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BloodRequestCreate {
    #[schema(value_type = String, format = "uuid")]
    pub hospital_id: HospitalId,
    pub blood_type: BloodType,
    pub units_requested: i32,
    pub priority: Priority,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BloodRequestResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: BloodRequestId,
    pub request_code: String,
    #[schema(value_type = String, format = "uuid")]
    pub patient_id: PatientId,
    #[schema(value_type = String, format = "uuid")]
    pub hospital_id: HospitalId,
    pub blood_type: BloodType,
    pub units_requested: i32,
    pub priority: Priority,
    pub status: RequestStatus,
    /// Response-time estimate quoted for the request's priority.
    pub estimated_response_time: String,
    pub notes: Option<String>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<BloodRequestDBResponse> for BloodRequestResponse {
    fn from(db: BloodRequestDBResponse) -> Self {
        Self {
            id: db.id,
            request_code: db.request_code,
            patient_id: db.patient_id,
            hospital_id: db.hospital_id,
            blood_type: db.blood_type,
            units_requested: db.units_requested,
            priority: db.priority,
            status: db.status,
            estimated_response_time: db.priority.estimated_response_time().to_string(),
            notes: db.notes,
            rejection_reason: db.rejection_reason,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// A hospital's verdict on a pending request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DispositionAction {
    Approve,
    Reject,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DispositionRequest {
    pub action: DispositionAction,
    /// Required when rejecting, ignored when approving.
    pub reason: Option<String>,
}

/// Query parameters for listing requests.
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ListRequestsQuery {
    pub status: Option<RequestStatus>,
}
