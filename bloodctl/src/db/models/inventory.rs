//! Database models for the inventory ledger.

use crate::types::{BloodType, HospitalId, InventoryLineId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database response for one ledger line (hospital x blood type)
#[derive(Debug, Clone, FromRow)]
pub struct InventoryLineDBResponse {
    pub id: InventoryLineId,
    pub hospital_id: HospitalId,
    pub blood_type: BloodType,
    pub units_available: i32,
    pub units_reserved: i32,
    pub low_stock_threshold: i32,
    pub critical_stock_threshold: i32,
    pub last_updated: DateTime<Utc>,
}

/// Database response for the cross-hospital availability search
#[derive(Debug, Clone, FromRow)]
pub struct AvailabilityDBResponse {
    pub hospital_id: HospitalId,
    pub hospital_name: String,
    pub city: String,
    pub blood_type: BloodType,
    pub units_available: i32,
}
