//! API models for donation offers.

use crate::db::models::donation_offers::DonationOfferDBResponse;
use crate::types::{BloodType, DonationOfferId, DonorId, HospitalId, OfferStatus};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Default collection volume when the donor does not specify one.
pub const DEFAULT_VOLUME_ML: i32 = 450;
/// Accepted collection volume bounds.
pub const MIN_VOLUME_ML: i32 = 200;
pub const MAX_VOLUME_ML: i32 = 500;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DonationOfferCreate {
    #[schema(value_type = String, format = "uuid")]
    pub hospital_id: HospitalId,
    /// Proposed collection volume in millilitres (default: 450)
    pub volume_ml: Option<i32>,
    pub offered_date: NaiveDate,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DonationOfferResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: DonationOfferId,
    pub offer_code: String,
    #[schema(value_type = String, format = "uuid")]
    pub donor_id: DonorId,
    #[schema(value_type = String, format = "uuid")]
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

impl From<DonationOfferDBResponse> for DonationOfferResponse {
    fn from(db: DonationOfferDBResponse) -> Self {
        Self {
            id: db.id,
            offer_code: db.offer_code,
            donor_id: db.donor_id,
            hospital_id: db.hospital_id,
            blood_type: db.blood_type,
            volume_ml: db.volume_ml,
            offered_date: db.offered_date,
            status: db.status,
            notes: db.notes,
            rejection_reason: db.rejection_reason,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// A hospital's verdict on a pending offer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OfferDispositionAction {
    Accept,
    Reject,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OfferDispositionRequest {
    pub action: OfferDispositionAction,
    /// Required when rejecting, ignored when accepting.
    pub reason: Option<String>,
}

/// Query parameters for listing offers.
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ListOffersQuery {
    pub status: Option<OfferStatus>,
}
