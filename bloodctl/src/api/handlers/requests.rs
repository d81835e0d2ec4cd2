//! Blood request admission, listing, disposition, and completion.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    AppState, audit,
    api::models::{
        requests::{
            BloodRequestCreate, BloodRequestResponse, DispositionAction, DispositionRequest, ListRequestsQuery,
            MAX_UNITS_PER_REQUEST, MIN_UNITS_PER_REQUEST,
        },
        users::{CurrentUser, Role},
    },
    auth::current_user::require_role,
    db::{
        handlers::{BloodRequests, Hospitals, Inventory, Patients},
        models::blood_requests::BloodRequestCreateDBRequest,
    },
    errors::Error,
    notifications,
    types::{BloodRequestId, NotificationPriority, RequestStatus},
};

use super::generate_code;

/// Submit a blood request, reserving inventory at the target hospital
#[utoipa::path(
    post,
    path = "/api/v1/requests",
    request_body = BloodRequestCreate,
    tag = "requests",
    responses(
        (status = 201, description = "Request admitted and inventory reserved", body = BloodRequestResponse),
        (status = 400, description = "Invalid input or unverified hospital"),
        (status = 403, description = "Not a patient"),
        (status = 404, description = "Hospital or patient profile not found"),
        (status = 409, description = "Insufficient stock"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn submit_request(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<BloodRequestCreate>,
) -> Result<(StatusCode, Json<BloodRequestResponse>), Error> {
    require_role(&current_user, Role::Patient, "blood requests")?;

    if !(MIN_UNITS_PER_REQUEST..=MAX_UNITS_PER_REQUEST).contains(&request.units_requested) {
        return Err(Error::BadRequest {
            message: format!("units_requested must be between {MIN_UNITS_PER_REQUEST} and {MAX_UNITS_PER_REQUEST}"),
        });
    }

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let patient = {
        let mut patients = Patients::new(&mut tx);
        patients.get_by_user_id(current_user.id).await?.ok_or_else(|| Error::NotFound {
            resource: "patient profile".to_string(),
            id: current_user.id.to_string(),
        })?
    };

    let hospital = {
        let mut hospitals = Hospitals::new(&mut tx);
        hospitals.get_by_id(request.hospital_id).await?.ok_or_else(|| Error::NotFound {
            resource: "hospital".to_string(),
            id: request.hospital_id.to_string(),
        })?
    };
    if !hospital.is_verified {
        return Err(Error::BadRequest {
            message: "Hospital is not verified".to_string(),
        });
    }

    // Reservation and insert commit atomically; a failed guard rolls back both
    let mut inventory = Inventory::new(&mut tx);
    let reserved = inventory
        .reserve(hospital.id, request.blood_type, request.units_requested)
        .await?;
    if !reserved {
        let available = inventory
            .get_line(hospital.id, request.blood_type)
            .await?
            .map(|line| line.units_available)
            .unwrap_or(0);
        return Err(Error::InsufficientStock {
            blood_type: request.blood_type,
            requested: request.units_requested,
            available,
        });
    }

    let created = {
        let mut requests = BloodRequests::new(&mut tx);
        requests
            .create(&BloodRequestCreateDBRequest {
                request_code: generate_code("REQ"),
                patient_id: patient.id,
                hospital_id: hospital.id,
                blood_type: request.blood_type,
                units_requested: request.units_requested,
                priority: request.priority,
                notes: request.notes.clone(),
            })
            .await?
    };

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    notifications::notify(
        &state.db,
        hospital.user_id,
        "New blood request",
        format!(
            "Request {} for {} unit(s) of {} ({} priority)",
            created.request_code, created.units_requested, created.blood_type, created.priority
        ),
        created.priority.notification_priority(),
    );
    audit::record(
        &state.db,
        Some(current_user.id),
        "request.submitted",
        "blood_request",
        Some(created.id.to_string()),
        None,
        Some(serde_json::json!({
            "request_code": created.request_code,
            "blood_type": created.blood_type,
            "units_requested": created.units_requested,
            "priority": created.priority,
        })),
    );

    Ok((StatusCode::CREATED, Json(BloodRequestResponse::from(created))))
}

/// List blood requests visible to the caller
#[utoipa::path(
    get,
    path = "/api/v1/requests",
    tag = "requests",
    params(ListRequestsQuery),
    responses(
        (status = 200, description = "Requests for the caller", body = Vec<BloodRequestResponse>),
        (status = 403, description = "Role has no request view"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_requests(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ListRequestsQuery>,
) -> Result<Json<Vec<BloodRequestResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let requests = match current_user.role {
        Role::Patient => {
            let patient = {
                let mut patients = Patients::new(&mut conn);
                patients.get_by_user_id(current_user.id).await?.ok_or_else(|| Error::NotFound {
                    resource: "patient profile".to_string(),
                    id: current_user.id.to_string(),
                })?
            };
            let mut repo = BloodRequests::new(&mut conn);
            repo.list_for_patient(patient.id).await?
        }
        Role::Hospital => {
            let hospital = {
                let mut hospitals = Hospitals::new(&mut conn);
                hospitals.get_by_user_id(current_user.id).await?.ok_or_else(|| Error::NotFound {
                    resource: "hospital profile".to_string(),
                    id: current_user.id.to_string(),
                })?
            };
            let mut repo = BloodRequests::new(&mut conn);
            repo.list_for_hospital(hospital.id, query.status).await?
        }
        _ => {
            return Err(Error::Forbidden {
                action: "list".to_string(),
                resource: "blood requests".to_string(),
            });
        }
    };

    Ok(Json(requests.into_iter().map(BloodRequestResponse::from).collect()))
}

/// Get a single blood request
#[utoipa::path(
    get,
    path = "/api/v1/requests/{id}",
    tag = "requests",
    params(("id" = String, Path, description = "Request ID")),
    responses(
        (status = 200, description = "The request", body = BloodRequestResponse),
        (status = 403, description = "Not the owner or addressed hospital"),
        (status = 404, description = "Request not found"),
    )
)]
#[tracing::instrument(skip_all, fields(request_id = %id))]
pub async fn get_request(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<BloodRequestId>,
) -> Result<Json<BloodRequestResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let request = {
        let mut repo = BloodRequests::new(&mut conn);
        repo.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
            resource: "blood request".to_string(),
            id: id.to_string(),
        })?
    };

    let allowed = match current_user.role {
        Role::Admin => true,
        Role::Patient => {
            let mut patients = Patients::new(&mut conn);
            patients
                .get_by_user_id(current_user.id)
                .await?
                .is_some_and(|p| p.id == request.patient_id)
        }
        Role::Hospital => {
            let mut hospitals = Hospitals::new(&mut conn);
            hospitals
                .get_by_user_id(current_user.id)
                .await?
                .is_some_and(|h| h.id == request.hospital_id)
        }
        Role::Donor => false,
    };

    if !allowed {
        return Err(Error::Forbidden {
            action: "view".to_string(),
            resource: "this blood request".to_string(),
        });
    }

    Ok(Json(BloodRequestResponse::from(request)))
}

/// Approve or reject a pending request (addressed hospital only)
#[utoipa::path(
    post,
    path = "/api/v1/requests/{id}/disposition",
    request_body = DispositionRequest,
    tag = "requests",
    params(("id" = String, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Request resolved", body = BloodRequestResponse),
        (status = 400, description = "Rejection without a reason"),
        (status = 403, description = "Not the addressed hospital"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request already resolved"),
    )
)]
#[tracing::instrument(skip_all, fields(request_id = %id))]
pub async fn dispose_request(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<BloodRequestId>,
    Json(disposition): Json<DispositionRequest>,
) -> Result<Json<BloodRequestResponse>, Error> {
    require_role(&current_user, Role::Hospital, "request disposition")?;

    if disposition.action == DispositionAction::Reject && disposition.reason.as_deref().map(str::trim).unwrap_or("").is_empty() {
        return Err(Error::BadRequest {
            message: "A reason is required when rejecting a request".to_string(),
        });
    }

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let hospital = {
        let mut hospitals = Hospitals::new(&mut tx);
        hospitals.get_by_user_id(current_user.id).await?.ok_or_else(|| Error::NotFound {
            resource: "hospital profile".to_string(),
            id: current_user.id.to_string(),
        })?
    };

    let request = {
        let mut repo = BloodRequests::new(&mut tx);
        repo.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
            resource: "blood request".to_string(),
            id: id.to_string(),
        })?
    };
    if request.hospital_id != hospital.id {
        return Err(Error::Forbidden {
            action: "resolve".to_string(),
            resource: "a request addressed to another hospital".to_string(),
        });
    }

    let (new_status, reason) = match disposition.action {
        DispositionAction::Approve => (RequestStatus::Approved, None),
        DispositionAction::Reject => (RequestStatus::Rejected, disposition.reason.as_deref()),
    };

    // The pending-status guard makes a second disposition a no-op here
    let resolved = {
        let mut repo = BloodRequests::new(&mut tx);
        repo.dispose(id, new_status, reason).await?.ok_or_else(|| Error::Conflict {
            message: "Request has already been resolved".to_string(),
        })?
    };

    // Rejection returns the reserved units to available stock atomically
    if new_status == RequestStatus::Rejected {
        let mut inventory = Inventory::new(&mut tx);
        let released = inventory
            .release(resolved.hospital_id, resolved.blood_type, resolved.units_requested)
            .await?;
        if !released {
            return Err(Error::Internal {
                operation: format!("release reservation for request {}", resolved.request_code),
            });
        }
    }

    let patient = {
        let mut patients = Patients::new(&mut tx);
        patients.get_by_id(resolved.patient_id).await?
    };

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    if let Some(patient) = patient {
        let (title, body) = match new_status {
            RequestStatus::Approved => (
                "Blood request approved",
                format!("Request {} has been approved by the hospital", resolved.request_code),
            ),
            _ => (
                "Blood request rejected",
                format!(
                    "Request {} was rejected: {}",
                    resolved.request_code,
                    resolved.rejection_reason.as_deref().unwrap_or("no reason given")
                ),
            ),
        };
        notifications::notify(&state.db, patient.user_id, title, body, NotificationPriority::High);
    }
    audit::record(
        &state.db,
        Some(current_user.id),
        match new_status {
            RequestStatus::Approved => "request.approved",
            _ => "request.rejected",
        },
        "blood_request",
        Some(resolved.id.to_string()),
        Some(serde_json::json!({ "status": RequestStatus::Pending })),
        Some(serde_json::json!({ "status": resolved.status })),
    );

    Ok(Json(BloodRequestResponse::from(resolved)))
}

/// Mark an approved request completed, finalizing the reservation
#[utoipa::path(
    post,
    path = "/api/v1/requests/{id}/completion",
    tag = "requests",
    params(("id" = String, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Request completed", body = BloodRequestResponse),
        (status = 403, description = "Not the addressed hospital"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request is not approved"),
    )
)]
#[tracing::instrument(skip_all, fields(request_id = %id))]
pub async fn complete_request(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<BloodRequestId>,
) -> Result<Json<BloodRequestResponse>, Error> {
    require_role(&current_user, Role::Hospital, "request completion")?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let hospital = {
        let mut hospitals = Hospitals::new(&mut tx);
        hospitals.get_by_user_id(current_user.id).await?.ok_or_else(|| Error::NotFound {
            resource: "hospital profile".to_string(),
            id: current_user.id.to_string(),
        })?
    };

    let request = {
        let mut repo = BloodRequests::new(&mut tx);
        repo.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
            resource: "blood request".to_string(),
            id: id.to_string(),
        })?
    };
    if request.hospital_id != hospital.id {
        return Err(Error::Forbidden {
            action: "complete".to_string(),
            resource: "a request addressed to another hospital".to_string(),
        });
    }

    let completed = {
        let mut repo = BloodRequests::new(&mut tx);
        repo.complete(id).await?.ok_or_else(|| Error::Conflict {
            message: "Only approved requests can be completed".to_string(),
        })?
    };

    // The units leave the system with the handover
    let mut inventory = Inventory::new(&mut tx);
    let finalized = inventory
        .finalize_consumption(completed.hospital_id, completed.blood_type, completed.units_requested)
        .await?;
    if !finalized {
        return Err(Error::Internal {
            operation: format!("finalize consumption for request {}", completed.request_code),
        });
    }

    let patient = {
        let mut patients = Patients::new(&mut tx);
        patients.get_by_id(completed.patient_id).await?
    };

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    if let Some(patient) = patient {
        notifications::notify(
            &state.db,
            patient.user_id,
            "Blood request completed",
            format!("Request {} has been fulfilled", completed.request_code),
            NotificationPriority::Normal,
        );
    }
    audit::record(
        &state.db,
        Some(current_user.id),
        "request.completed",
        "blood_request",
        Some(completed.id.to_string()),
        Some(serde_json::json!({ "status": RequestStatus::Approved })),
        Some(serde_json::json!({ "status": completed.status })),
    );

    Ok(Json(BloodRequestResponse::from(completed)))
}
