//! API models for the inventory ledger.

use crate::db::models::inventory::{AvailabilityDBResponse, InventoryLineDBResponse};
use crate::types::{BloodType, HospitalId, InventoryLineId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InventoryLineResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: InventoryLineId,
    #[schema(value_type = String, format = "uuid")]
    pub hospital_id: HospitalId,
    pub blood_type: BloodType,
    pub units_available: i32,
    pub units_reserved: i32,
    pub low_stock: bool,
    pub critical_stock: bool,
    pub last_updated: DateTime<Utc>,
}

impl From<InventoryLineDBResponse> for InventoryLineResponse {
    fn from(db: InventoryLineDBResponse) -> Self {
        Self {
            id: db.id,
            hospital_id: db.hospital_id,
            blood_type: db.blood_type,
            units_available: db.units_available,
            units_reserved: db.units_reserved,
            low_stock: db.units_available <= db.low_stock_threshold,
            critical_stock: db.units_available <= db.critical_stock_threshold,
            last_updated: db.last_updated,
        }
    }
}

/// Upper bound on a single restock delivery.
pub const MAX_RESTOCK_UNITS: i32 = 1000;

/// Restock request for a hospital's own ledger.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RestockRequest {
    pub blood_type: BloodType,
    /// Units to add to available stock (1 to 1000)
    pub units: i32,
}

/// Query parameters for the public availability search.
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct AvailabilityQuery {
    pub blood_type: BloodType,
    /// Minimum units a hospital must hold to appear (default: 1)
    pub min_units: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AvailabilityResponse {
    #[schema(value_type = String, format = "uuid")]
    pub hospital_id: HospitalId,
    pub hospital_name: String,
    pub city: String,
    pub blood_type: BloodType,
    pub units_available: i32,
}

impl From<AvailabilityDBResponse> for AvailabilityResponse {
    fn from(db: AvailabilityDBResponse) -> Self {
        Self {
            hospital_id: db.hospital_id,
            hospital_name: db.hospital_name,
            city: db.city,
            blood_type: db.blood_type,
            units_available: db.units_available,
        }
    }
}
