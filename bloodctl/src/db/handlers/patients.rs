//! Database repository for patient profiles.

use crate::db::errors::Result;
use crate::db::models::patients::{PatientCreateDBRequest, PatientDBResponse};
use crate::types::{PatientId, UserId, abbrev_uuid};
use sqlx::PgConnection;
use tracing::instrument;

pub struct Patients<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Patients<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id)), err)]
    pub async fn create(&mut self, request: &PatientCreateDBRequest) -> Result<PatientDBResponse> {
        let patient = sqlx::query_as::<_, PatientDBResponse>(
            r#"
            INSERT INTO patients (user_id, date_of_birth, blood_type, phone)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(request.user_id)
        .bind(request.date_of_birth)
        .bind(request.blood_type)
        .bind(&request.phone)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(patient)
    }

    #[instrument(skip(self), fields(patient_id = %abbrev_uuid(&id)), err)]
    pub async fn get_by_id(&mut self, id: PatientId) -> Result<Option<PatientDBResponse>> {
        let patient = sqlx::query_as::<_, PatientDBResponse>("SELECT * FROM patients WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(patient)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn get_by_user_id(&mut self, user_id: UserId) -> Result<Option<PatientDBResponse>> {
        let patient = sqlx::query_as::<_, PatientDBResponse>("SELECT * FROM patients WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(patient)
    }
}
