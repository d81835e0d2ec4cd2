//! Donation offer admission, listing, and disposition.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;

use crate::{
    AppState, audit,
    api::models::{
        offers::{
            DEFAULT_VOLUME_ML, DonationOfferCreate, DonationOfferResponse, ListOffersQuery, MAX_VOLUME_ML, MIN_VOLUME_ML,
            OfferDispositionAction, OfferDispositionRequest,
        },
        users::{CurrentUser, Role},
    },
    auth::current_user::require_role,
    db::{
        handlers::{DonationOffers, Donors, Hospitals},
        models::donation_offers::DonationOfferCreateDBRequest,
    },
    errors::Error,
    notifications,
    types::{DonationOfferId, NotificationPriority, OfferStatus},
};

use super::generate_code;

/// Submit a donation offer to a hospital
#[utoipa::path(
    post,
    path = "/api/v1/offers",
    request_body = DonationOfferCreate,
    tag = "offers",
    responses(
        (status = 201, description = "Offer submitted", body = DonationOfferResponse),
        (status = 400, description = "Invalid volume, past date, or ineligible donor"),
        (status = 403, description = "Not a donor"),
        (status = 404, description = "Hospital or donor profile not found"),
        (status = 409, description = "Donor already has a pending offer"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn submit_offer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(offer): Json<DonationOfferCreate>,
) -> Result<(StatusCode, Json<DonationOfferResponse>), Error> {
    require_role(&current_user, Role::Donor, "donation offers")?;

    let volume_ml = offer.volume_ml.unwrap_or(DEFAULT_VOLUME_ML);
    if !(MIN_VOLUME_ML..=MAX_VOLUME_ML).contains(&volume_ml) {
        return Err(Error::BadRequest {
            message: format!("volume_ml must be between {MIN_VOLUME_ML} and {MAX_VOLUME_ML}"),
        });
    }
    if offer.offered_date < Utc::now().date_naive() {
        return Err(Error::BadRequest {
            message: "offered_date cannot be in the past".to_string(),
        });
    }

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let donor = {
        let mut donors = Donors::new(&mut tx);
        donors.get_by_user_id(current_user.id).await?.ok_or_else(|| Error::NotFound {
            resource: "donor profile".to_string(),
            id: current_user.id.to_string(),
        })?
    };
    if !donor.is_eligible {
        return Err(Error::BadRequest {
            message: "Donor is not currently eligible to donate".to_string(),
        });
    }

    let hospital = {
        let mut hospitals = Hospitals::new(&mut tx);
        hospitals.get_by_id(offer.hospital_id).await?.ok_or_else(|| Error::NotFound {
            resource: "hospital".to_string(),
            id: offer.hospital_id.to_string(),
        })?
    };
    if !hospital.is_verified {
        return Err(Error::BadRequest {
            message: "Hospital is not verified".to_string(),
        });
    }

    // Serialize concurrent submissions by this donor on the donor row, so the
    // pending-offer count below cannot race
    {
        let mut donors = Donors::new(&mut tx);
        donors.lock_for_submission(donor.id).await?;
    }

    let mut offers = DonationOffers::new(&mut tx);
    if offers.count_pending_for_donor(donor.id).await? > 0 {
        return Err(Error::Conflict {
            message: "You already have a pending donation offer".to_string(),
        });
    }

    let created = offers
        .create(&DonationOfferCreateDBRequest {
            offer_code: generate_code("DON"),
            donor_id: donor.id,
            hospital_id: hospital.id,
            blood_type: donor.blood_type,
            volume_ml,
            offered_date: offer.offered_date,
            notes: offer.notes.clone(),
        })
        .await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    notifications::notify(
        &state.db,
        hospital.user_id,
        "New donation offer",
        format!(
            "Offer {} of {} mL ({}) for {}",
            created.offer_code, created.volume_ml, created.blood_type, created.offered_date
        ),
        NotificationPriority::Normal,
    );
    audit::record(
        &state.db,
        Some(current_user.id),
        "offer.submitted",
        "donation_offer",
        Some(created.id.to_string()),
        None,
        Some(serde_json::json!({
            "offer_code": created.offer_code,
            "blood_type": created.blood_type,
            "volume_ml": created.volume_ml,
        })),
    );

    Ok((StatusCode::CREATED, Json(DonationOfferResponse::from(created))))
}

/// List donation offers visible to the caller
#[utoipa::path(
    get,
    path = "/api/v1/offers",
    tag = "offers",
    params(ListOffersQuery),
    responses(
        (status = 200, description = "Offers for the caller", body = Vec<DonationOfferResponse>),
        (status = 403, description = "Role has no offer view"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_offers(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ListOffersQuery>,
) -> Result<Json<Vec<DonationOfferResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let offers = match current_user.role {
        Role::Donor => {
            let donor = {
                let mut donors = Donors::new(&mut conn);
                donors.get_by_user_id(current_user.id).await?.ok_or_else(|| Error::NotFound {
                    resource: "donor profile".to_string(),
                    id: current_user.id.to_string(),
                })?
            };
            let mut repo = DonationOffers::new(&mut conn);
            repo.list_for_donor(donor.id).await?
        }
        Role::Hospital => {
            let hospital = {
                let mut hospitals = Hospitals::new(&mut conn);
                hospitals.get_by_user_id(current_user.id).await?.ok_or_else(|| Error::NotFound {
                    resource: "hospital profile".to_string(),
                    id: current_user.id.to_string(),
                })?
            };
            let mut repo = DonationOffers::new(&mut conn);
            repo.list_for_hospital(hospital.id, query.status).await?
        }
        _ => {
            return Err(Error::Forbidden {
                action: "list".to_string(),
                resource: "donation offers".to_string(),
            });
        }
    };

    Ok(Json(offers.into_iter().map(DonationOfferResponse::from).collect()))
}

/// Accept or reject a pending offer (addressed hospital only)
#[utoipa::path(
    post,
    path = "/api/v1/offers/{id}/disposition",
    request_body = OfferDispositionRequest,
    tag = "offers",
    params(("id" = String, Path, description = "Offer ID")),
    responses(
        (status = 200, description = "Offer resolved", body = DonationOfferResponse),
        (status = 400, description = "Rejection without a reason"),
        (status = 403, description = "Not the addressed hospital"),
        (status = 404, description = "Offer not found"),
        (status = 409, description = "Offer already resolved"),
    )
)]
#[tracing::instrument(skip_all, fields(offer_id = %id))]
pub async fn dispose_offer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<DonationOfferId>,
    Json(disposition): Json<OfferDispositionRequest>,
) -> Result<Json<DonationOfferResponse>, Error> {
    require_role(&current_user, Role::Hospital, "offer disposition")?;

    if disposition.action == OfferDispositionAction::Reject
        && disposition.reason.as_deref().map(str::trim).unwrap_or("").is_empty()
    {
        return Err(Error::BadRequest {
            message: "A reason is required when rejecting an offer".to_string(),
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

    let offer = {
        let mut repo = DonationOffers::new(&mut tx);
        repo.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
            resource: "donation offer".to_string(),
            id: id.to_string(),
        })?
    };
    if offer.hospital_id != hospital.id {
        return Err(Error::Forbidden {
            action: "resolve".to_string(),
            resource: "an offer addressed to another hospital".to_string(),
        });
    }

    let (new_status, reason) = match disposition.action {
        OfferDispositionAction::Accept => (OfferStatus::Accepted, None),
        OfferDispositionAction::Reject => (OfferStatus::Rejected, disposition.reason.as_deref()),
    };

    let resolved = {
        let mut repo = DonationOffers::new(&mut tx);
        repo.dispose(id, new_status, reason).await?.ok_or_else(|| Error::Conflict {
            message: "Offer has already been resolved".to_string(),
        })?
    };

    let donor = {
        let mut donors = Donors::new(&mut tx);
        donors.get_by_id(resolved.donor_id).await?
    };

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    if let Some(donor) = donor {
        let (title, body) = match new_status {
            OfferStatus::Accepted => (
                "Donation offer accepted",
                format!("Offer {} was accepted; see you on {}", resolved.offer_code, resolved.offered_date),
            ),
            _ => (
                "Donation offer rejected",
                format!(
                    "Offer {} was rejected: {}",
                    resolved.offer_code,
                    resolved.rejection_reason.as_deref().unwrap_or("no reason given")
                ),
            ),
        };
        notifications::notify(&state.db, donor.user_id, title, body, NotificationPriority::Normal);
    }
    audit::record(
        &state.db,
        Some(current_user.id),
        match new_status {
            OfferStatus::Accepted => "offer.accepted",
            _ => "offer.rejected",
        },
        "donation_offer",
        Some(resolved.id.to_string()),
        Some(serde_json::json!({ "status": OfferStatus::Pending })),
        Some(serde_json::json!({ "status": resolved.status })),
    );

    Ok(Json(DonationOfferResponse::from(resolved)))
}

/// Mark an accepted offer completed once the blood has been collected
#[utoipa::path(
    post,
    path = "/api/v1/offers/{id}/completion",
    tag = "offers",
    params(("id" = String, Path, description = "Offer ID")),
    responses(
        (status = 200, description = "Offer completed", body = DonationOfferResponse),
        (status = 403, description = "Not the addressed hospital"),
        (status = 404, description = "Offer not found"),
        (status = 409, description = "Offer is not accepted"),
    )
)]
#[tracing::instrument(skip_all, fields(offer_id = %id))]
pub async fn complete_offer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<DonationOfferId>,
) -> Result<Json<DonationOfferResponse>, Error> {
    require_role(&current_user, Role::Hospital, "offer completion")?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let hospital = {
        let mut hospitals = Hospitals::new(&mut tx);
        hospitals.get_by_user_id(current_user.id).await?.ok_or_else(|| Error::NotFound {
            resource: "hospital profile".to_string(),
            id: current_user.id.to_string(),
        })?
    };

    let offer = {
        let mut repo = DonationOffers::new(&mut tx);
        repo.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
            resource: "donation offer".to_string(),
            id: id.to_string(),
        })?
    };
    if offer.hospital_id != hospital.id {
        return Err(Error::Forbidden {
            action: "complete".to_string(),
            resource: "an offer addressed to another hospital".to_string(),
        });
    }

    let completed = {
        let mut repo = DonationOffers::new(&mut tx);
        repo.complete(id).await?.ok_or_else(|| Error::Conflict {
            message: "Only accepted offers can be completed".to_string(),
        })?
    };

    // Collected units enter the ledger later through an explicit restock, once
    // the blood has been processed; completion only closes out the offer.
    let donor = {
        let mut donors = Donors::new(&mut tx);
        donors.record_donation(completed.donor_id, completed.offered_date).await?;
        donors.get_by_id(completed.donor_id).await?
    };

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    if let Some(donor) = donor {
        notifications::notify(
            &state.db,
            donor.user_id,
            "Donation completed",
            format!("Thank you! Donation {} has been collected", completed.offer_code),
            NotificationPriority::Normal,
        );
    }
    audit::record(
        &state.db,
        Some(current_user.id),
        "offer.completed",
        "donation_offer",
        Some(completed.id.to_string()),
        Some(serde_json::json!({ "status": OfferStatus::Accepted })),
        Some(serde_json::json!({ "status": completed.status })),
    );

    Ok(Json(DonationOfferResponse::from(completed)))
}
