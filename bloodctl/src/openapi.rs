//! OpenAPI documentation for the HTTP API.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::api;

/// Bearer session-token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "BearerAuth".to_string(),
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Session token obtained from /authentication/login"))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    paths(
        api::handlers::auth::register,
        api::handlers::auth::login,
        api::handlers::auth::me,
        api::handlers::hospitals::list_hospitals,
        api::handlers::hospitals::list_pending_hospitals,
        api::handlers::hospitals::verify_hospital,
        api::handlers::inventory::list_inventory,
        api::handlers::inventory::restock,
        api::handlers::inventory::search_availability,
        api::handlers::requests::submit_request,
        api::handlers::requests::list_requests,
        api::handlers::requests::get_request,
        api::handlers::requests::dispose_request,
        api::handlers::requests::complete_request,
        api::handlers::offers::submit_offer,
        api::handlers::offers::list_offers,
        api::handlers::offers::dispose_offer,
        api::handlers::offers::complete_offer,
        api::handlers::users::list_users,
        api::handlers::notifications::list_notifications,
        api::handlers::notifications::mark_notification_read,
        api::handlers::activity::list_activity,
    ),
    components(schemas(
        api::models::users::Role,
        api::models::users::RoleProfile,
        api::models::users::RegisterRequest,
        api::models::users::LoginRequest,
        api::models::users::AuthResponse,
        api::models::users::UserResponse,
        api::models::hospitals::HospitalResponse,
        api::models::inventory::InventoryLineResponse,
        api::models::inventory::RestockRequest,
        api::models::inventory::AvailabilityResponse,
        api::models::requests::BloodRequestCreate,
        api::models::requests::BloodRequestResponse,
        api::models::requests::DispositionRequest,
        api::models::requests::DispositionAction,
        api::models::offers::DonationOfferCreate,
        api::models::offers::DonationOfferResponse,
        api::models::offers::OfferDispositionRequest,
        api::models::offers::OfferDispositionAction,
        api::models::notifications::NotificationResponse,
        api::models::activity::ActivityLogResponse,
        crate::types::BloodType,
        crate::types::Priority,
        crate::types::RequestStatus,
        crate::types::OfferStatus,
        crate::types::NotificationPriority,
    )),
    tags(
        (name = "authentication", description = "Registration and sessions"),
        (name = "hospitals", description = "Hospital directory and verification"),
        (name = "inventory", description = "Inventory ledger and availability"),
        (name = "requests", description = "Blood request lifecycle"),
        (name = "offers", description = "Donation offer lifecycle"),
        (name = "users", description = "Admin user directory"),
        (name = "notifications", description = "In-app notifications"),
        (name = "activity", description = "Audit trail of state changes"),
    )
)]
pub struct ApiDoc;
