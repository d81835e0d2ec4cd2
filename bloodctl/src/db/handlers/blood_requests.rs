//! Database repository for blood requests.

use crate::db::errors::Result;
use crate::db::models::blood_requests::{BloodRequestCreateDBRequest, BloodRequestDBResponse};
use crate::types::{BloodRequestId, HospitalId, PatientId, RequestStatus, abbrev_uuid};
use sqlx::PgConnection;
use tracing::instrument;

pub struct BloodRequests<'c> {
    db: &'c mut PgConnection,
}

impl<'c> BloodRequests<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(request_code = %request.request_code), err)]
    pub async fn create(&mut self, request: &BloodRequestCreateDBRequest) -> Result<BloodRequestDBResponse> {
        let created = sqlx::query_as::<_, BloodRequestDBResponse>(
            r#"
            INSERT INTO blood_requests
                (request_code, patient_id, hospital_id, blood_type, units_requested, priority, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&request.request_code)
        .bind(request.patient_id)
        .bind(request.hospital_id)
        .bind(request.blood_type)
        .bind(request.units_requested)
        .bind(request.priority)
        .bind(&request.notes)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(created)
    }

    #[instrument(skip(self), fields(request_id = %abbrev_uuid(&id)), err)]
    pub async fn get_by_id(&mut self, id: BloodRequestId) -> Result<Option<BloodRequestDBResponse>> {
        let request = sqlx::query_as::<_, BloodRequestDBResponse>("SELECT * FROM blood_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(request)
    }

    #[instrument(skip(self), fields(patient_id = %abbrev_uuid(&patient_id)), err)]
    pub async fn list_for_patient(&mut self, patient_id: PatientId) -> Result<Vec<BloodRequestDBResponse>> {
        let requests = sqlx::query_as::<_, BloodRequestDBResponse>(
            "SELECT * FROM blood_requests WHERE patient_id = $1 ORDER BY created_at DESC",
        )
        .bind(patient_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(requests)
    }

    #[instrument(skip(self), fields(hospital_id = %abbrev_uuid(&hospital_id)), err)]
    pub async fn list_for_hospital(
        &mut self,
        hospital_id: HospitalId,
        status: Option<RequestStatus>,
    ) -> Result<Vec<BloodRequestDBResponse>> {
        let requests = sqlx::query_as::<_, BloodRequestDBResponse>(
            r#"
            SELECT * FROM blood_requests
            WHERE hospital_id = $1 AND ($2::request_status IS NULL OR status = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(hospital_id)
        .bind(status)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(requests)
    }

    /// Transition a pending request to its disposition. Returns None when the
    /// request is not pending, which is how double dispositions surface.
    #[instrument(skip(self), fields(request_id = %abbrev_uuid(&id), status = ?new_status), err)]
    pub async fn dispose(
        &mut self,
        id: BloodRequestId,
        new_status: RequestStatus,
        rejection_reason: Option<&str>,
    ) -> Result<Option<BloodRequestDBResponse>> {
        let request = sqlx::query_as::<_, BloodRequestDBResponse>(
            r#"
            UPDATE blood_requests
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

        Ok(request)
    }

    /// Transition an approved request to completed. Returns None unless the
    /// request is currently approved.
    #[instrument(skip(self), fields(request_id = %abbrev_uuid(&id)), err)]
    pub async fn complete(&mut self, id: BloodRequestId) -> Result<Option<BloodRequestDBResponse>> {
        let request = sqlx::query_as::<_, BloodRequestDBResponse>(
            r#"
            UPDATE blood_requests
            SET status = 'completed', updated_at = NOW()
            WHERE id = $1 AND status = 'approved'
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(request)
    }
}
