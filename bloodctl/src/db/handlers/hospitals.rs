//! Database repository for hospital profiles.

use crate::db::errors::Result;
use crate::db::models::hospitals::{HospitalCreateDBRequest, HospitalDBResponse};
use crate::types::{HospitalId, UserId, abbrev_uuid};
use sqlx::PgConnection;
use tracing::instrument;

pub struct Hospitals<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Hospitals<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    pub async fn create(&mut self, request: &HospitalCreateDBRequest) -> Result<HospitalDBResponse> {
        let hospital = sqlx::query_as::<_, HospitalDBResponse>(
            r#"
            INSERT INTO hospitals (user_id, name, address, city, phone, license_number)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(request.user_id)
        .bind(&request.name)
        .bind(&request.address)
        .bind(&request.city)
        .bind(&request.phone)
        .bind(&request.license_number)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(hospital)
    }

    #[instrument(skip(self), fields(hospital_id = %abbrev_uuid(&id)), err)]
    pub async fn get_by_id(&mut self, id: HospitalId) -> Result<Option<HospitalDBResponse>> {
        let hospital = sqlx::query_as::<_, HospitalDBResponse>("SELECT * FROM hospitals WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(hospital)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn get_by_user_id(&mut self, user_id: UserId) -> Result<Option<HospitalDBResponse>> {
        let hospital = sqlx::query_as::<_, HospitalDBResponse>("SELECT * FROM hospitals WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(hospital)
    }

    #[instrument(skip(self), err)]
    pub async fn list_verified(&mut self) -> Result<Vec<HospitalDBResponse>> {
        let hospitals = sqlx::query_as::<_, HospitalDBResponse>(
            "SELECT * FROM hospitals WHERE is_verified ORDER BY name",
        )
        .fetch_all(&mut *self.db)
        .await?;

        Ok(hospitals)
    }

    #[instrument(skip(self), err)]
    pub async fn list_pending(&mut self) -> Result<Vec<HospitalDBResponse>> {
        let hospitals = sqlx::query_as::<_, HospitalDBResponse>(
            "SELECT * FROM hospitals WHERE NOT is_verified ORDER BY created_at",
        )
        .fetch_all(&mut *self.db)
        .await?;

        Ok(hospitals)
    }

    /// Mark a hospital verified. Returns None when the hospital is already
    /// verified or does not exist, so callers can distinguish via a prior get.
    #[instrument(skip(self), fields(hospital_id = %abbrev_uuid(&id)), err)]
    pub async fn verify(&mut self, id: HospitalId) -> Result<Option<HospitalDBResponse>> {
        let hospital = sqlx::query_as::<_, HospitalDBResponse>(
            r#"
            UPDATE hospitals
            SET is_verified = TRUE, updated_at = NOW()
            WHERE id = $1 AND NOT is_verified
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(hospital)
    }
}
