//! Database repository for the inventory ledger.
//!
//! Every balance mutation is a single conditional UPDATE so concurrent
//! transactions can never drive a counter negative: the guard is evaluated
//! under the row lock, and a zero rows-affected result means the guard failed.
//! Callers run these inside the transaction that owns the rest of the
//! operation, so a failed guard rolls everything back together.

use crate::db::errors::Result;
use crate::db::models::inventory::{AvailabilityDBResponse, InventoryLineDBResponse};
use crate::types::{BloodType, HospitalId, abbrev_uuid};
use sqlx::PgConnection;
use tracing::instrument;

pub struct Inventory<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Inventory<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Create zero-balance ledger lines for every blood type at a hospital.
    /// Idempotent, so re-verifying a hospital is harmless.
    #[instrument(skip(self), fields(hospital_id = %abbrev_uuid(&hospital_id)), err)]
    pub async fn seed_hospital(&mut self, hospital_id: HospitalId) -> Result<()> {
        for blood_type in BloodType::ALL {
            sqlx::query(
                r#"
                INSERT INTO blood_inventory (hospital_id, blood_type)
                VALUES ($1, $2)
                ON CONFLICT (hospital_id, blood_type) DO NOTHING
                "#,
            )
            .bind(hospital_id)
            .bind(blood_type)
            .execute(&mut *self.db)
            .await?;
        }

        Ok(())
    }

    #[instrument(skip(self), fields(hospital_id = %abbrev_uuid(&hospital_id)), err)]
    pub async fn get_line(&mut self, hospital_id: HospitalId, blood_type: BloodType) -> Result<Option<InventoryLineDBResponse>> {
        let line = sqlx::query_as::<_, InventoryLineDBResponse>(
            "SELECT * FROM blood_inventory WHERE hospital_id = $1 AND blood_type = $2",
        )
        .bind(hospital_id)
        .bind(blood_type)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(line)
    }

    #[instrument(skip(self), fields(hospital_id = %abbrev_uuid(&hospital_id)), err)]
    pub async fn list_for_hospital(&mut self, hospital_id: HospitalId) -> Result<Vec<InventoryLineDBResponse>> {
        let lines = sqlx::query_as::<_, InventoryLineDBResponse>(
            "SELECT * FROM blood_inventory WHERE hospital_id = $1 ORDER BY blood_type",
        )
        .bind(hospital_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(lines)
    }

    /// Search verified hospitals holding at least `min_units` of a blood type.
    #[instrument(skip(self), err)]
    pub async fn search_availability(&mut self, blood_type: BloodType, min_units: i32) -> Result<Vec<AvailabilityDBResponse>> {
        let rows = sqlx::query_as::<_, AvailabilityDBResponse>(
            r#"
            SELECT i.hospital_id, h.name AS hospital_name, h.city, i.blood_type, i.units_available
            FROM blood_inventory i
            INNER JOIN hospitals h ON h.id = i.hospital_id
            WHERE i.blood_type = $1 AND i.units_available >= $2 AND h.is_verified
            ORDER BY i.units_available DESC
            "#,
        )
        .bind(blood_type)
        .bind(min_units)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(rows)
    }

    /// Move units from available to reserved. Returns false when the line is
    /// missing or holds fewer than `units` available (the two cases are
    /// deliberately indistinguishable: an absent line is zero stock).
    #[instrument(skip(self), fields(hospital_id = %abbrev_uuid(&hospital_id), units), err)]
    pub async fn reserve(&mut self, hospital_id: HospitalId, blood_type: BloodType, units: i32) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE blood_inventory
            SET units_available = units_available - $3,
                units_reserved = units_reserved + $3,
                last_updated = NOW()
            WHERE hospital_id = $1 AND blood_type = $2 AND units_available >= $3
            "#,
        )
        .bind(hospital_id)
        .bind(blood_type)
        .bind(units)
        .execute(&mut *self.db)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Move units back from reserved to available. Returns false when fewer
    /// than `units` are reserved, which indicates a bookkeeping bug upstream.
    #[instrument(skip(self), fields(hospital_id = %abbrev_uuid(&hospital_id), units), err)]
    pub async fn release(&mut self, hospital_id: HospitalId, blood_type: BloodType, units: i32) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE blood_inventory
            SET units_reserved = units_reserved - $3,
                units_available = units_available + $3,
                last_updated = NOW()
            WHERE hospital_id = $1 AND blood_type = $2 AND units_reserved >= $3
            "#,
        )
        .bind(hospital_id)
        .bind(blood_type)
        .bind(units)
        .execute(&mut *self.db)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Remove reserved units from the ledger entirely (units leave the system
    /// when a fulfilled request is handed over).
    #[instrument(skip(self), fields(hospital_id = %abbrev_uuid(&hospital_id), units), err)]
    pub async fn finalize_consumption(&mut self, hospital_id: HospitalId, blood_type: BloodType, units: i32) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE blood_inventory
            SET units_reserved = units_reserved - $3,
                last_updated = NOW()
            WHERE hospital_id = $1 AND blood_type = $2 AND units_reserved >= $3
            "#,
        )
        .bind(hospital_id)
        .bind(blood_type)
        .bind(units)
        .execute(&mut *self.db)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Add units to available stock. This is how stock enters the ledger.
    #[instrument(skip(self), fields(hospital_id = %abbrev_uuid(&hospital_id), units), err)]
    pub async fn restock(&mut self, hospital_id: HospitalId, blood_type: BloodType, units: i32) -> Result<Option<InventoryLineDBResponse>> {
        let line = sqlx::query_as::<_, InventoryLineDBResponse>(
            r#"
            UPDATE blood_inventory
            SET units_available = units_available + $3,
                last_updated = NOW()
            WHERE hospital_id = $1 AND blood_type = $2
            RETURNING *
            "#,
        )
        .bind(hospital_id)
        .bind(blood_type)
        .bind(units)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(line)
    }
}
