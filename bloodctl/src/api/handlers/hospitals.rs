//! Hospital directory and admin verification.

use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    AppState, audit,
    api::models::{hospitals::HospitalResponse, users::CurrentUser},
    auth::current_user::require_admin,
    db::handlers::{Hospitals, Inventory},
    errors::Error,
    notifications,
    types::{HospitalId, NotificationPriority},
};

/// List verified hospitals
#[utoipa::path(
    get,
    path = "/api/v1/hospitals",
    tag = "hospitals",
    responses(
        (status = 200, description = "Verified hospitals", body = Vec<HospitalResponse>),
        (status = 401, description = "Not authenticated"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_hospitals(State(state): State<AppState>, _current_user: CurrentUser) -> Result<Json<Vec<HospitalResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut hospitals = Hospitals::new(&mut conn);

    let list = hospitals.list_verified().await?;

    Ok(Json(list.into_iter().map(HospitalResponse::from).collect()))
}

/// List hospitals awaiting verification (admin only)
#[utoipa::path(
    get,
    path = "/api/v1/hospitals/pending",
    tag = "hospitals",
    responses(
        (status = 200, description = "Hospitals awaiting verification", body = Vec<HospitalResponse>),
        (status = 403, description = "Not an admin"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_pending_hospitals(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<Vec<HospitalResponse>>, Error> {
    require_admin(&current_user, "pending hospitals")?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut hospitals = Hospitals::new(&mut conn);

    let list = hospitals.list_pending().await?;

    Ok(Json(list.into_iter().map(HospitalResponse::from).collect()))
}

/// Verify a hospital and seed its inventory ledger (admin only)
#[utoipa::path(
    post,
    path = "/api/v1/hospitals/{id}/verify",
    tag = "hospitals",
    params(("id" = String, Path, description = "Hospital ID")),
    responses(
        (status = 200, description = "Hospital verified", body = HospitalResponse),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "Hospital not found"),
        (status = 409, description = "Hospital already verified"),
    )
)]
#[tracing::instrument(skip_all, fields(hospital_id = %id))]
pub async fn verify_hospital(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<HospitalId>,
) -> Result<Json<HospitalResponse>, Error> {
    require_admin(&current_user, "hospital verification")?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let mut hospitals = Hospitals::new(&mut tx);
    let verified = match hospitals.verify(id).await? {
        Some(hospital) => hospital,
        None => {
            // Distinguish missing from already-verified for the caller
            return match hospitals.get_by_id(id).await? {
                Some(_) => Err(Error::Conflict {
                    message: "Hospital is already verified".to_string(),
                }),
                None => Err(Error::NotFound {
                    resource: "hospital".to_string(),
                    id: id.to_string(),
                }),
            };
        }
    };

    // Zero-balance ledger lines for every blood type
    let mut inventory = Inventory::new(&mut tx);
    inventory.seed_hospital(id).await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    notifications::notify(
        &state.db,
        verified.user_id,
        "Hospital verified",
        format!("{} has been verified and can now manage blood inventory", verified.name),
        NotificationPriority::Normal,
    );
    audit::record(
        &state.db,
        Some(current_user.id),
        "hospital.verified",
        "hospital",
        Some(verified.id.to_string()),
        None,
        Some(serde_json::json!({ "is_verified": true })),
    );

    Ok(Json(HospitalResponse::from(verified)))
}
