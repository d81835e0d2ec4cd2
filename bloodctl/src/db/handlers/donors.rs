//! Database repository for donor profiles.

use crate::db::errors::Result;
use crate::db::models::donors::{DonorCreateDBRequest, DonorDBResponse};
use crate::types::{DonorId, UserId, abbrev_uuid};
use sqlx::PgConnection;
use tracing::instrument;

pub struct Donors<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Donors<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id)), err)]
    pub async fn create(&mut self, request: &DonorCreateDBRequest) -> Result<DonorDBResponse> {
        let donor = sqlx::query_as::<_, DonorDBResponse>(
            r#"
            INSERT INTO donors (user_id, blood_type, date_of_birth, weight_kg)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(request.user_id)
        .bind(request.blood_type)
        .bind(request.date_of_birth)
        .bind(request.weight_kg)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(donor)
    }

    #[instrument(skip(self), fields(donor_id = %abbrev_uuid(&id)), err)]
    pub async fn get_by_id(&mut self, id: DonorId) -> Result<Option<DonorDBResponse>> {
        let donor = sqlx::query_as::<_, DonorDBResponse>("SELECT * FROM donors WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(donor)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn get_by_user_id(&mut self, user_id: UserId) -> Result<Option<DonorDBResponse>> {
        let donor = sqlx::query_as::<_, DonorDBResponse>("SELECT * FROM donors WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(donor)
    }

    /// Record a completed donation against the donor profile.
    #[instrument(skip(self), fields(donor_id = %abbrev_uuid(&id)), err)]
    pub async fn record_donation(&mut self, id: DonorId, donated_on: chrono::NaiveDate) -> Result<bool> {
        let result = sqlx::query("UPDATE donors SET last_donation_date = $2 WHERE id = $1")
            .bind(id)
            .bind(donated_on)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lock the donor row for the rest of the transaction. Offer submissions
    /// for the same donor serialize on this lock, which makes the
    /// count-then-insert below it race-free.
    #[instrument(skip(self), fields(donor_id = %abbrev_uuid(&id)), err)]
    pub async fn lock_for_submission(&mut self, id: DonorId) -> Result<bool> {
        let locked = sqlx::query_scalar::<_, DonorId>("SELECT id FROM donors WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(locked.is_some())
    }
}
