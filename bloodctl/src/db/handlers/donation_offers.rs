//! Database repository for donation offers.

use crate::db::errors::Result;
use crate::db::models::donation_offers::{DonationOfferCreateDBRequest, DonationOfferDBResponse};
use crate::types::{DonationOfferId, DonorId, HospitalId, OfferStatus, abbrev_uuid};
use sqlx::PgConnection;
use tracing::instrument;

pub struct DonationOffers<'c> {
    db: &'c mut PgConnection,
}

impl<'c> DonationOffers<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Count a donor's pending offers. Only meaningful for uniqueness checks
    /// when the caller holds the donor row lock.
    #[instrument(skip(self), fields(donor_id = %abbrev_uuid(&donor_id)), err)]
    pub async fn count_pending_for_donor(&mut self, donor_id: DonorId) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM donation_offers WHERE donor_id = $1 AND status = 'pending'",
        )
        .bind(donor_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(count)
    }

    #[instrument(skip(self, request), fields(offer_code = %request.offer_code), err)]
    pub async fn create(&mut self, request: &DonationOfferCreateDBRequest) -> Result<DonationOfferDBResponse> {
        let created = sqlx::query_as::<_, DonationOfferDBResponse>(
            r#"
            INSERT INTO donation_offers
                (offer_code, donor_id, hospital_id, blood_type, volume_ml, offered_date, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&request.offer_code)
        .bind(request.donor_id)
        .bind(request.hospital_id)
        .bind(request.blood_type)
        .bind(request.volume_ml)
        .bind(request.offered_date)
        .bind(&request.notes)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(created)
    }

    #[instrument(skip(self), fields(offer_id = %abbrev_uuid(&id)), err)]
    pub async fn get_by_id(&mut self, id: DonationOfferId) -> Result<Option<DonationOfferDBResponse>> {
        let offer = sqlx::query_as::<_, DonationOfferDBResponse>("SELECT * FROM donation_offers WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(offer)
    }

    #[instrument(skip(self), fields(donor_id = %abbrev_uuid(&donor_id)), err)]
    pub async fn list_for_donor(&mut self, donor_id: DonorId) -> Result<Vec<DonationOfferDBResponse>> {
        let offers = sqlx::query_as::<_, DonationOfferDBResponse>(
            "SELECT * FROM donation_offers WHERE donor_id = $1 ORDER BY created_at DESC",
        )
        .bind(donor_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(offers)
    }

    #[instrument(skip(self), fields(hospital_id = %abbrev_uuid(&hospital_id)), err)]
    pub async fn list_for_hospital(
        &mut self,
        hospital_id: HospitalId,
        status: Option<OfferStatus>,
    ) -> Result<Vec<DonationOfferDBResponse>> {
        let offers = sqlx::query_as::<_, DonationOfferDBResponse>(
            r#"
            SELECT * FROM donation_offers
            WHERE hospital_id = $1 AND ($2::offer_status IS NULL OR status = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(hospital_id)
        .bind(status)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(offers)
    }

    /// Transition a pending offer to its disposition. Returns None when the
    /// offer is not pending.
    #[instrument(skip(self), fields(offer_id = %abbrev_uuid(&id), status = ?new_status), err)]
    pub async fn dispose(
        &mut self,
        id: DonationOfferId,
        new_status: OfferStatus,
        rejection_reason: Option<&str>,
    ) -> Result<Option<DonationOfferDBResponse>> {
        let offer = sqlx::query_as::<_, DonationOfferDBResponse>(
            r#"
            UPDATE donation_offers
            SET status = $2, rejection_reason = $3, updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(new_status)
        .bind(rejection_reason)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(offer)
    }

    /// Mark an accepted offer completed. Returns None when the offer is not
    /// accepted, so completion happens at most once.
    #[instrument(skip(self), fields(offer_id = %abbrev_uuid(&id)), err)]
    pub async fn complete(&mut self, id: DonationOfferId) -> Result<Option<DonationOfferDBResponse>> {
        let offer = sqlx::query_as::<_, DonationOfferDBResponse>(
            r#"
            UPDATE donation_offers
            SET status = 'completed', updated_at = NOW()
            WHERE id = $1 AND status = 'accepted'
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(offer)
    }
}
