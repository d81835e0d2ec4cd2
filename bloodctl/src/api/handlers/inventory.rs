//! A hospital's own ledger, restocking, and the public availability search.

use axum::{
    Json,
    extract::{Query, State},
};

use crate::{
    AppState, audit,
    api::models::{
        inventory::{AvailabilityQuery, AvailabilityResponse, InventoryLineResponse, MAX_RESTOCK_UNITS, RestockRequest},
        users::{CurrentUser, Role},
    },
    auth::current_user::require_role,
    db::handlers::{Hospitals, Inventory},
    db::models::hospitals::HospitalDBResponse,
    errors::Error,
};
use sqlx::PgConnection;

/// Resolve the caller's hospital profile, requiring it to be verified.
async fn own_verified_hospital(conn: &mut PgConnection, current_user: &CurrentUser) -> Result<HospitalDBResponse, Error> {
    let mut hospitals = Hospitals::new(conn);
    let hospital = hospitals
        .get_by_user_id(current_user.id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "hospital profile".to_string(),
            id: current_user.id.to_string(),
        })?;

    if !hospital.is_verified {
        return Err(Error::Forbidden {
            action: "manage inventory".to_string(),
            resource: "an unverified hospital".to_string(),
        });
    }

    Ok(hospital)
}

/// List the authenticated hospital's inventory ledger
#[utoipa::path(
    get,
    path = "/api/v1/inventory",
    tag = "inventory",
    responses(
        (status = 200, description = "Ledger lines for the hospital", body = Vec<InventoryLineResponse>),
        (status = 403, description = "Not a verified hospital"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_inventory(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<Vec<InventoryLineResponse>>, Error> {
    require_role(&current_user, Role::Hospital, "inventory")?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let hospital = own_verified_hospital(&mut conn, &current_user).await?;

    let mut inventory = Inventory::new(&mut conn);
    let lines = inventory.list_for_hospital(hospital.id).await?;

    Ok(Json(lines.into_iter().map(InventoryLineResponse::from).collect()))
}

/// Add units of a blood type to the hospital's available stock
#[utoipa::path(
    post,
    path = "/api/v1/inventory/restock",
    request_body = RestockRequest,
    tag = "inventory",
    responses(
        (status = 200, description = "Updated ledger line", body = InventoryLineResponse),
        (status = 400, description = "Invalid unit count"),
        (status = 403, description = "Not a verified hospital"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn restock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<RestockRequest>,
) -> Result<Json<InventoryLineResponse>, Error> {
    require_role(&current_user, Role::Hospital, "inventory")?;

    if !(1..=MAX_RESTOCK_UNITS).contains(&request.units) {
        return Err(Error::BadRequest {
            message: format!("Restock units must be between 1 and {MAX_RESTOCK_UNITS}"),
        });
    }

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let hospital = own_verified_hospital(&mut tx, &current_user).await?;

    let mut inventory = Inventory::new(&mut tx);
    let line = inventory
        .restock(hospital.id, request.blood_type, request.units)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "inventory line".to_string(),
            id: format!("{} {}", hospital.id, request.blood_type),
        })?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    audit::record(
        &state.db,
        Some(current_user.id),
        "inventory.restocked",
        "inventory",
        Some(line.id.to_string()),
        None,
        Some(serde_json::json!({
            "blood_type": request.blood_type,
            "units_added": request.units,
            "units_available": line.units_available,
        })),
    );

    Ok(Json(InventoryLineResponse::from(line)))
}

/// Search verified hospitals with stock of a blood type
#[utoipa::path(
    get,
    path = "/api/v1/availability",
    tag = "inventory",
    params(AvailabilityQuery),
    responses(
        (status = 200, description = "Hospitals holding the blood type", body = Vec<AvailabilityResponse>),
        (status = 400, description = "Invalid query"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn search_availability(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Vec<AvailabilityResponse>>, Error> {
    let min_units = query.min_units.unwrap_or(1);
    if min_units <= 0 {
        return Err(Error::BadRequest {
            message: "min_units must be a positive integer".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut inventory = Inventory::new(&mut conn);

    let rows = inventory.search_availability(query.blood_type, min_units).await?;

    Ok(Json(rows.into_iter().map(AvailabilityResponse::from).collect()))
}
