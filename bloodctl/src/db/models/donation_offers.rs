//! Database models for donation offers.

use crate::types::{BloodType, DonationOfferId, DonorId, HospitalId, OfferStatus};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

/// Database request for creating a donation offer
#[derive(Debug, Clone)]
pub struct DonationOfferCreateDBRequest {
    pub offer_code: String,
    pub donor_id: DonorId,
    pub hospital_id: HospitalId,
    pub blood_type: BloodType,
    pub volume_ml: i32,
    pub offered_date: NaiveDate,
    pub notes: Option<String>,
}

/// Database response for a donation offer
#[derive(Debug, Clone, FromRow)]
pub struct DonationOfferDBResponse {
    pub id: DonationOfferId,
    pub offer_code: String,
    pub donor_id: DonorId,
    pub hospital_id: HospitalId,
    pub blood_type: BloodType,
    pub volume_ml: i32,
    pub offered_date: NaiveDate,
    pub status: OfferStatus,
    pub notes: Option<String>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
