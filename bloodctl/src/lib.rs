//! # bloodctl: Blood Network Control Layer
//!
//! `bloodctl` is a coordination backend connecting hospitals, blood donors, and patients.
//! It keeps a per-hospital inventory ledger of blood units, admits patient requests against
//! that ledger, and routes donor offers to hospitals, exposing the whole lifecycle over a
//! RESTful API.
//!
//! ## Overview
//!
//! Hospitals register and are verified by an administrator before they can participate.
//! Each verified hospital carries an inventory ledger with one line per blood type, split
//! into available and reserved units. Patients submit blood requests against a hospital;
//! admission atomically reserves the requested units so two requests can never claim the
//! same stock. The hospital then approves or rejects the request exactly once: rejection
//! returns the reservation to available stock, approval holds it until the handover is
//! completed and the units leave the system. Donors submit donation offers (at most one
//! pending at a time) which hospitals accept or reject; accepted donations enter the
//! ledger through an explicit restock once the blood is processed.
//!
//! Every state change notifies the affected party through in-app notifications and is
//! recorded in an activity log. Both are fire-and-forget: they happen after the owning
//! transaction commits and never fail the operation.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for the HTTP
//! layer and PostgreSQL for persistence. The **API layer** ([`api`]) exposes the
//! management surface under `/api/v1/*` with authentication endpoints at
//! `/authentication/*`. The **authentication layer** ([`auth`]) issues JWT session
//! tokens, delivered both as bearer tokens and as an HttpOnly session cookie. The
//! **database layer** ([`db`]) uses the repository pattern; every balance mutation on
//! the ledger is a single conditional UPDATE so concurrent transactions cannot drive a
//! counter negative.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use bloodctl::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = bloodctl::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     bloodctl::telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
pub mod api;
pub mod audit;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod notifications;
mod openapi;
pub mod telemetry;
pub mod types;

#[cfg(test)]
pub mod test_utils;

use crate::{
    api::models::users::Role,
    auth::password,
    db::handlers::{Repository, Users},
    db::models::users::{UserCreateDBRequest, UserUpdateDBRequest},
    openapi::ApiDoc,
};
use axum::{
    Json, Router,
    http::HeaderValue,
    routing::{get, post},
};
use bon::Builder;
pub use config::Config;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;

pub use types::{BloodRequestId, DonationOfferId, DonorId, HospitalId, PatientId, UserId};

/// Application state shared across all request handlers.
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
}

/// Get the bloodctl database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create the initial admin user if it doesn't exist.
///
/// This function is idempotent: it creates the admin account on first startup, and on
/// later startups updates the password if one is configured. The admin role is not
/// registerable through the API, so this is the only way an admin account comes to exist.
#[instrument(skip_all)]
pub async fn create_initial_admin_user(email: &str, admin_password: Option<&str>, db: &PgPool) -> anyhow::Result<UserId> {
    // Without a configured password the account still exists (so it shows up in the
    // ledger's audit trail) but cannot be logged into until a password is set.
    let password_hash = match admin_password {
        Some(pwd) => password::hash_string(pwd).map_err(|e| anyhow::anyhow!("Failed to hash admin password: {e}"))?,
        None => password::hash_string(&uuid::Uuid::new_v4().to_string())
            .map_err(|e| anyhow::anyhow!("Failed to hash placeholder admin password: {e}"))?,
    };

    let mut tx = db.begin().await?;
    let mut user_repo = Users::new(&mut tx);

    if let Some(existing_user) = user_repo.get_user_by_email(email).await? {
        if admin_password.is_some() {
            user_repo
                .update(
                    existing_user.id,
                    &UserUpdateDBRequest {
                        password_hash: Some(password_hash),
                        ..Default::default()
                    },
                )
                .await?;
        }
        tx.commit().await?;
        return Ok(existing_user.id);
    }

    let created_user = user_repo
        .create(&UserCreateDBRequest {
            email: email.to_string(),
            password_hash,
            first_name: "System".to_string(),
            last_name: "Administrator".to_string(),
            role: Role::Admin,
        })
        .await?;

    tx.commit().await?;
    Ok(created_user.id)
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = Vec::new();
    for origin in &config.auth.security.cors.allowed_origins {
        origins.push(origin.parse::<HeaderValue>()?);
    }

    let mut cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(config.auth.security.cors.allow_credentials)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PATCH,
            axum::http::Method::DELETE,
        ])
        .allow_headers([axum::http::header::AUTHORIZATION, axum::http::header::CONTENT_TYPE]);

    if let Some(max_age) = config.auth.security.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the main application router with all endpoints and middleware.
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    // Authentication routes at root level
    let auth_routes = Router::new()
        .route("/authentication/register", post(api::handlers::auth::register))
        .route("/authentication/login", post(api::handlers::auth::login))
        .route("/authentication/me", get(api::handlers::auth::me))
        .with_state(state.clone());

    // API routes
    let api_routes = Router::new()
        // Hospital directory and admin verification
        .route("/hospitals", get(api::handlers::hospitals::list_hospitals))
        .route("/hospitals/pending", get(api::handlers::hospitals::list_pending_hospitals))
        .route("/hospitals/{id}/verify", post(api::handlers::hospitals::verify_hospital))
        // Inventory ledger
        .route("/inventory", get(api::handlers::inventory::list_inventory))
        .route("/inventory/restock", post(api::handlers::inventory::restock))
        .route("/availability", get(api::handlers::inventory::search_availability))
        // Blood request lifecycle
        .route("/requests", post(api::handlers::requests::submit_request))
        .route("/requests", get(api::handlers::requests::list_requests))
        .route("/requests/{id}", get(api::handlers::requests::get_request))
        .route("/requests/{id}/disposition", post(api::handlers::requests::dispose_request))
        .route("/requests/{id}/completion", post(api::handlers::requests::complete_request))
        // Donation offer lifecycle
        .route("/offers", post(api::handlers::offers::submit_offer))
        .route("/offers", get(api::handlers::offers::list_offers))
        .route("/offers/{id}/disposition", post(api::handlers::offers::dispose_offer))
        .route("/offers/{id}/completion", post(api::handlers::offers::complete_offer))
        // Admin user directory and activity feed
        .route("/users", get(api::handlers::users::list_users))
        .route("/activity", get(api::handlers::activity::list_activity))
        // In-app notifications
        .route("/notifications", get(api::handlers::notifications::list_notifications))
        .route(
            "/notifications/{id}/read",
            post(api::handlers::notifications::mark_notification_read),
        )
        .with_state(state.clone());

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .merge(auth_routes)
        .nest("/api/v1", api_routes);

    // CORS from config, then tracing around everything
    let cors_layer = create_cors_layer(&state.config)?;
    let router = router.layer(cors_layer).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// Main application struct that owns all resources and lifecycle.
///
/// 1. **Create**: [`Application::new`] connects to the database, runs migrations, and
///    provisions the initial admin user
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and starts handling requests
/// 3. **Shutdown**: when the shutdown future resolves, in-flight requests drain and the
///    pool closes
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        Self::new_with_pool(config, None).await
    }

    /// Create a new application instance, optionally reusing an existing pool (tests)
    pub async fn new_with_pool(config: Config, pool: Option<PgPool>) -> anyhow::Result<Self> {
        debug!("Starting control layer with configuration: {:#?}", config);

        let pool = match pool {
            Some(pool) => pool,
            None => {
                sqlx::postgres::PgPoolOptions::new()
                    .max_connections(config.database.max_connections)
                    .connect(&config.database.url)
                    .await?
            }
        };

        migrator().run(&pool).await?;

        create_initial_admin_user(&config.admin_email, config.admin_password.as_deref(), &pool)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create initial admin user: {}", e))?;

        let app_state = AppState::builder().db(pool.clone()).config(config.clone()).build();
        let router = build_router(&app_state)?;

        Ok(Self { router, config, pool })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router.into_make_service()).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Blood network control layer listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::create_initial_admin_user;
    use crate::{
        db::handlers::{Donors, Inventory},
        test_utils::*,
        types::{BloodType, HospitalId},
    };
    use axum::http::StatusCode;
    use sqlx::PgPool;

    async fn ledger_line(pool: &PgPool, hospital_id: HospitalId, blood_type: BloodType) -> (i32, i32) {
        let mut conn = pool.acquire().await.expect("Failed to acquire connection");
        let line = Inventory::new(&mut conn)
            .get_line(hospital_id, blood_type)
            .await
            .expect("Failed to read ledger line")
            .expect("Ledger line should exist");
        (line.units_available, line.units_reserved)
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_initial_admin_user_is_idempotent(pool: PgPool) {
        let first = create_initial_admin_user("admin@example.com", Some("changeme123"), &pool)
            .await
            .expect("first call should succeed");
        let second = create_initial_admin_user("admin@example.com", Some("changeme456"), &pool)
            .await
            .expect("second call should succeed");

        assert_eq!(first, second);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_healthz_and_openapi(pool: PgPool) {
        let server = create_test_app(pool).await;

        let response = server.get("/healthz").await;
        response.assert_status_ok();
        assert_eq!(response.text(), "OK");

        let response = server.get("/api-docs/openapi.json").await;
        response.assert_status_ok();
        let doc: serde_json::Value = response.json();
        assert!(doc["paths"]["/api/v1/requests"].is_object());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_unauthenticated_requests_rejected(pool: PgPool) {
        let server = create_test_app(pool).await;

        let response = server.get("/api/v1/requests").await;
        response.assert_status(StatusCode::UNAUTHORIZED);

        let body: serde_json::Value = response.json();
        assert_eq!(body["error"], "unauthenticated");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_request_admission_reserves_stock(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;

        let patient = register_patient(&server).await;
        let hospital_auth = register_hospital(&server).await;
        let hospital_id = verify_and_stock(&pool, hospital_auth.user.id, BloodType::ONegative, 5).await;

        let response = server
            .post("/api/v1/requests")
            .authorization_bearer(&patient.token)
            .json(&serde_json::json!({
                "hospital_id": hospital_id,
                "blood_type": "O-",
                "units_requested": 2,
                "priority": "emergency",
                "notes": "surgery tomorrow"
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body: serde_json::Value = response.json();
        assert!(body["request_code"].as_str().unwrap().starts_with("REQ-"));
        assert_eq!(body["status"], "pending");
        assert_eq!(body["estimated_response_time"], "15 minutes");

        // Admission moved the units from available to reserved
        assert_eq!(ledger_line(&pool, hospital_id, BloodType::ONegative).await, (3, 2));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_request_admission_insufficient_stock(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;

        let patient = register_patient(&server).await;
        let hospital_auth = register_hospital(&server).await;
        let hospital_id = verify_and_stock(&pool, hospital_auth.user.id, BloodType::ONegative, 1).await;

        let response = server
            .post("/api/v1/requests")
            .authorization_bearer(&patient.token)
            .json(&serde_json::json!({
                "hospital_id": hospital_id,
                "blood_type": "O-",
                "units_requested": 5,
                "priority": "urgent"
            }))
            .await;

        response.assert_status(StatusCode::CONFLICT);
        let body: serde_json::Value = response.json();
        assert_eq!(body["error"], "insufficient_stock");

        // Nothing moved
        assert_eq!(ledger_line(&pool, hospital_id, BloodType::ONegative).await, (1, 0));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_concurrent_requests_never_oversubscribe(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;

        let patient = register_patient(&server).await;
        let hospital_auth = register_hospital(&server).await;
        let hospital_id = verify_and_stock(&pool, hospital_auth.user.id, BloodType::ONegative, 5).await;

        let payload = serde_json::json!({
            "hospital_id": hospital_id,
            "blood_type": "O-",
            "units_requested": 2,
            "priority": "routine"
        });
        let submit = || async {
            server
                .post("/api/v1/requests")
                .authorization_bearer(&patient.token)
                .json(&payload)
                .await
        };

        // Five in-flight 2-unit requests against 5 available units: only two
        // can win, however they interleave
        let results = tokio::join!(submit(), submit(), submit(), submit(), submit());
        let responses = [results.0, results.1, results.2, results.3, results.4];

        let successes = responses
            .iter()
            .filter(|r| r.status_code() == StatusCode::CREATED)
            .count();
        assert_eq!(successes, 2);
        for response in responses.iter().filter(|r| r.status_code() != StatusCode::CREATED) {
            response.assert_status(StatusCode::CONFLICT);
            let body: serde_json::Value = response.json();
            assert_eq!(body["error"], "insufficient_stock");
        }

        // Two winners hold 4 reserved units; the odd unit stays available
        assert_eq!(ledger_line(&pool, hospital_id, BloodType::ONegative).await, (1, 4));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_request_admission_validations(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;

        let patient = register_patient(&server).await;
        let donor = register_donor(&server).await;
        let hospital_auth = register_hospital(&server).await;
        let hospital_id = verify_and_stock(&pool, hospital_auth.user.id, BloodType::APositive, 5).await;

        // Units out of range
        let response = server
            .post("/api/v1/requests")
            .authorization_bearer(&patient.token)
            .json(&serde_json::json!({
                "hospital_id": hospital_id,
                "blood_type": "A+",
                "units_requested": 0,
                "priority": "routine"
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        // Wrong role
        let response = server
            .post("/api/v1/requests")
            .authorization_bearer(&donor.token)
            .json(&serde_json::json!({
                "hospital_id": hospital_id,
                "blood_type": "A+",
                "units_requested": 1,
                "priority": "routine"
            }))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);

        // Unverified hospital
        let unverified = register_hospital(&server).await;
        let unverified_id = hospital_profile_id(&pool, unverified.user.id).await;
        let response = server
            .post("/api/v1/requests")
            .authorization_bearer(&patient.token)
            .json(&serde_json::json!({
                "hospital_id": unverified_id,
                "blood_type": "A+",
                "units_requested": 1,
                "priority": "routine"
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_rejection_releases_reservation_and_is_final(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;

        let patient = register_patient(&server).await;
        let hospital_auth = register_hospital(&server).await;
        let hospital_id = verify_and_stock(&pool, hospital_auth.user.id, BloodType::BPositive, 5).await;

        let response = server
            .post("/api/v1/requests")
            .authorization_bearer(&patient.token)
            .json(&serde_json::json!({
                "hospital_id": hospital_id,
                "blood_type": "B+",
                "units_requested": 3,
                "priority": "routine"
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let request: serde_json::Value = response.json();
        let request_id = request["id"].as_str().unwrap().to_string();
        assert_eq!(ledger_line(&pool, hospital_id, BloodType::BPositive).await, (2, 3));

        // Rejecting without a reason is invalid
        let response = server
            .post(&format!("/api/v1/requests/{request_id}/disposition"))
            .authorization_bearer(&hospital_auth.token)
            .json(&serde_json::json!({ "action": "reject" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let response = server
            .post(&format!("/api/v1/requests/{request_id}/disposition"))
            .authorization_bearer(&hospital_auth.token)
            .json(&serde_json::json!({ "action": "reject", "reason": "crossmatch failed" }))
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["status"], "rejected");
        assert_eq!(body["rejection_reason"], "crossmatch failed");

        // Reservation returned to available stock
        assert_eq!(ledger_line(&pool, hospital_id, BloodType::BPositive).await, (5, 0));

        // A second disposition hits the pending-only guard
        let response = server
            .post(&format!("/api/v1/requests/{request_id}/disposition"))
            .authorization_bearer(&hospital_auth.token)
            .json(&serde_json::json!({ "action": "approve" }))
            .await;
        response.assert_status(StatusCode::CONFLICT);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_approval_then_completion_consumes_units(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;

        let patient = register_patient(&server).await;
        let hospital_auth = register_hospital(&server).await;
        let hospital_id = verify_and_stock(&pool, hospital_auth.user.id, BloodType::AbNegative, 4).await;

        let response = server
            .post("/api/v1/requests")
            .authorization_bearer(&patient.token)
            .json(&serde_json::json!({
                "hospital_id": hospital_id,
                "blood_type": "AB-",
                "units_requested": 2,
                "priority": "urgent"
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let request: serde_json::Value = response.json();
        let request_id = request["id"].as_str().unwrap().to_string();

        // Completing a pending request is invalid
        let response = server
            .post(&format!("/api/v1/requests/{request_id}/completion"))
            .authorization_bearer(&hospital_auth.token)
            .await;
        response.assert_status(StatusCode::CONFLICT);

        let response = server
            .post(&format!("/api/v1/requests/{request_id}/disposition"))
            .authorization_bearer(&hospital_auth.token)
            .json(&serde_json::json!({ "action": "approve" }))
            .await;
        response.assert_status_ok();
        // Approval keeps the reservation held
        assert_eq!(ledger_line(&pool, hospital_id, BloodType::AbNegative).await, (2, 2));

        let response = server
            .post(&format!("/api/v1/requests/{request_id}/completion"))
            .authorization_bearer(&hospital_auth.token)
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["status"], "completed");

        // Handed-over units leave the ledger
        assert_eq!(ledger_line(&pool, hospital_id, BloodType::AbNegative).await, (2, 0));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_disposition_limited_to_addressed_hospital(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;

        let patient = register_patient(&server).await;
        let hospital_auth = register_hospital(&server).await;
        let other_hospital = register_hospital(&server).await;
        let hospital_id = verify_and_stock(&pool, hospital_auth.user.id, BloodType::OPositive, 5).await;
        verify_and_stock(&pool, other_hospital.user.id, BloodType::OPositive, 5).await;

        let response = server
            .post("/api/v1/requests")
            .authorization_bearer(&patient.token)
            .json(&serde_json::json!({
                "hospital_id": hospital_id,
                "blood_type": "O+",
                "units_requested": 1,
                "priority": "routine"
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let request: serde_json::Value = response.json();
        let request_id = request["id"].as_str().unwrap().to_string();

        let response = server
            .post(&format!("/api/v1/requests/{request_id}/disposition"))
            .authorization_bearer(&other_hospital.token)
            .json(&serde_json::json!({ "action": "approve" }))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_pending_offer_rejected(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;

        let donor = register_donor(&server).await;
        let hospital_auth = register_hospital(&server).await;
        let hospital_id = verify_and_stock(&pool, hospital_auth.user.id, BloodType::ONegative, 0).await;

        let offer = serde_json::json!({
            "hospital_id": hospital_id,
            "offered_date": chrono::Utc::now().date_naive(),
        });

        let response = server
            .post("/api/v1/offers")
            .authorization_bearer(&donor.token)
            .json(&offer)
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: serde_json::Value = response.json();
        assert!(body["offer_code"].as_str().unwrap().starts_with("DON-"));
        assert_eq!(body["volume_ml"], 450);

        // Second offer while the first is still pending
        let response = server
            .post("/api/v1/offers")
            .authorization_bearer(&donor.token)
            .json(&offer)
            .await;
        response.assert_status(StatusCode::CONFLICT);
        let body: serde_json::Value = response.json();
        assert_eq!(body["error"], "conflict");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_offer_disposition_frees_donor_for_new_offer(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;

        let donor = register_donor(&server).await;
        let hospital_auth = register_hospital(&server).await;
        let hospital_id = verify_and_stock(&pool, hospital_auth.user.id, BloodType::ONegative, 0).await;

        let response = server
            .post("/api/v1/offers")
            .authorization_bearer(&donor.token)
            .json(&serde_json::json!({
                "hospital_id": hospital_id,
                "offered_date": chrono::Utc::now().date_naive(),
                "volume_ml": 300
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let offer: serde_json::Value = response.json();
        let offer_id = offer["id"].as_str().unwrap().to_string();

        let response = server
            .post(&format!("/api/v1/offers/{offer_id}/disposition"))
            .authorization_bearer(&hospital_auth.token)
            .json(&serde_json::json!({ "action": "accept" }))
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["status"], "accepted");

        // Acceptance has no ledger effect; stock enters via restock after processing
        assert_eq!(ledger_line(&pool, hospital_id, BloodType::ONegative).await, (0, 0));

        // Resolved offer no longer blocks a new one
        let response = server
            .post("/api/v1/offers")
            .authorization_bearer(&donor.token)
            .json(&serde_json::json!({
                "hospital_id": hospital_id,
                "offered_date": chrono::Utc::now().date_naive(),
            }))
            .await;
        response.assert_status(StatusCode::CREATED);

        // Re-disposition of the accepted offer conflicts
        let response = server
            .post(&format!("/api/v1/offers/{offer_id}/disposition"))
            .authorization_bearer(&hospital_auth.token)
            .json(&serde_json::json!({ "action": "reject", "reason": "late" }))
            .await;
        response.assert_status(StatusCode::CONFLICT);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_offer_completion_closes_accepted_offer(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;

        let donor = register_donor(&server).await;
        let hospital_auth = register_hospital(&server).await;
        let hospital_id = verify_and_stock(&pool, hospital_auth.user.id, BloodType::ONegative, 0).await;

        let offered_date = chrono::Utc::now().date_naive();
        let response = server
            .post("/api/v1/offers")
            .authorization_bearer(&donor.token)
            .json(&serde_json::json!({
                "hospital_id": hospital_id,
                "offered_date": offered_date,
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let offer: serde_json::Value = response.json();
        let offer_id = offer["id"].as_str().unwrap().to_string();

        // Completing a pending offer is invalid
        let response = server
            .post(&format!("/api/v1/offers/{offer_id}/completion"))
            .authorization_bearer(&hospital_auth.token)
            .await;
        response.assert_status(StatusCode::CONFLICT);

        let response = server
            .post(&format!("/api/v1/offers/{offer_id}/disposition"))
            .authorization_bearer(&hospital_auth.token)
            .json(&serde_json::json!({ "action": "accept" }))
            .await;
        response.assert_status_ok();

        let response = server
            .post(&format!("/api/v1/offers/{offer_id}/completion"))
            .authorization_bearer(&hospital_auth.token)
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["status"], "completed");

        // Completion closes the offer; collected units only enter the ledger
        // through a later restock
        assert_eq!(ledger_line(&pool, hospital_id, BloodType::ONegative).await, (0, 0));

        // The donation is recorded on the donor profile
        let mut conn = pool.acquire().await.expect("Failed to acquire connection");
        let profile = Donors::new(&mut conn)
            .get_by_user_id(donor.user.id)
            .await
            .expect("Failed to look up donor")
            .expect("Donor profile should exist");
        assert_eq!(profile.last_donation_date, Some(offered_date));

        // Completion happens at most once
        let response = server
            .post(&format!("/api/v1/offers/{offer_id}/completion"))
            .authorization_bearer(&hospital_auth.token)
            .await;
        response.assert_status(StatusCode::CONFLICT);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_ineligible_donor_cannot_offer(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;

        let donor = register_donor(&server).await;
        let hospital_auth = register_hospital(&server).await;
        let hospital_id = verify_and_stock(&pool, hospital_auth.user.id, BloodType::ONegative, 0).await;

        mark_donor_ineligible(&pool, donor.user.id).await;

        let response = server
            .post("/api/v1/offers")
            .authorization_bearer(&donor.token)
            .json(&serde_json::json!({
                "hospital_id": hospital_id,
                "offered_date": chrono::Utc::now().date_naive(),
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["error"], "validation_error");

        // No offer row was created
        let response = server.get("/api/v1/offers").authorization_bearer(&donor.token).await;
        response.assert_status_ok();
        let offers: serde_json::Value = response.json();
        assert!(offers.as_array().unwrap().is_empty());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_concurrent_duplicate_offers_yield_one_pending(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;

        let donor = register_donor(&server).await;
        let hospital_auth = register_hospital(&server).await;
        let hospital_id = verify_and_stock(&pool, hospital_auth.user.id, BloodType::ONegative, 0).await;

        let payload = serde_json::json!({
            "hospital_id": hospital_id,
            "offered_date": chrono::Utc::now().date_naive(),
        });
        let submit = || async {
            server
                .post("/api/v1/offers")
                .authorization_bearer(&donor.token)
                .json(&payload)
                .await
        };

        // The donor-row lock serializes these; exactly one wins
        let results = tokio::join!(submit(), submit(), submit(), submit());
        let responses = [results.0, results.1, results.2, results.3];

        let successes = responses
            .iter()
            .filter(|r| r.status_code() == StatusCode::CREATED)
            .count();
        assert_eq!(successes, 1);
        for response in responses.iter().filter(|r| r.status_code() != StatusCode::CREATED) {
            response.assert_status(StatusCode::CONFLICT);
            let body: serde_json::Value = response.json();
            assert_eq!(body["error"], "conflict");
        }

        let response = server.get("/api/v1/offers").authorization_bearer(&donor.token).await;
        response.assert_status_ok();
        let offers: serde_json::Value = response.json();
        assert_eq!(offers.as_array().unwrap().len(), 1);
        assert_eq!(offers[0]["status"], "pending");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_offer_validations(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;

        let donor = register_donor(&server).await;
        let hospital_auth = register_hospital(&server).await;
        let hospital_id = verify_and_stock(&pool, hospital_auth.user.id, BloodType::ONegative, 0).await;

        // Volume out of range
        let response = server
            .post("/api/v1/offers")
            .authorization_bearer(&donor.token)
            .json(&serde_json::json!({
                "hospital_id": hospital_id,
                "offered_date": chrono::Utc::now().date_naive(),
                "volume_ml": 100
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        // Past date
        let response = server
            .post("/api/v1/offers")
            .authorization_bearer(&donor.token)
            .json(&serde_json::json!({
                "hospital_id": hospital_id,
                "offered_date": "2020-01-01",
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_admin_verifies_hospital_and_seeds_ledger(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;

        let admin_token = login_admin(&server).await;
        let hospital_auth = register_hospital(&server).await;
        let hospital_id = hospital_profile_id(&pool, hospital_auth.user.id).await;

        // Unverified hospital shows up in the pending list
        let response = server
            .get("/api/v1/hospitals/pending")
            .authorization_bearer(&admin_token)
            .await;
        response.assert_status_ok();
        let pending: serde_json::Value = response.json();
        assert_eq!(pending.as_array().unwrap().len(), 1);

        // Non-admins cannot verify
        let response = server
            .post(&format!("/api/v1/hospitals/{hospital_id}/verify"))
            .authorization_bearer(&hospital_auth.token)
            .await;
        response.assert_status(StatusCode::FORBIDDEN);

        let response = server
            .post(&format!("/api/v1/hospitals/{hospital_id}/verify"))
            .authorization_bearer(&admin_token)
            .await;
        response.assert_status_ok();

        // Verification seeds one zero-balance ledger line per blood type
        let response = server
            .get("/api/v1/inventory")
            .authorization_bearer(&hospital_auth.token)
            .await;
        response.assert_status_ok();
        let lines: serde_json::Value = response.json();
        assert_eq!(lines.as_array().unwrap().len(), 8);

        // Re-verification conflicts
        let response = server
            .post(&format!("/api/v1/hospitals/{hospital_id}/verify"))
            .authorization_bearer(&admin_token)
            .await;
        response.assert_status(StatusCode::CONFLICT);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_admin_lists_users_by_role(pool: PgPool) {
        let server = create_test_app(pool).await;

        let admin_token = login_admin(&server).await;
        let patient = register_patient(&server).await;
        let hospital_auth = register_hospital(&server).await;

        let response = server
            .get("/api/v1/users")
            .authorization_bearer(&admin_token)
            .add_query_param("role", "hospital")
            .await;
        response.assert_status_ok();
        let users: serde_json::Value = response.json();
        let users = users.as_array().unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0]["role"], "hospital");
        assert_eq!(users[0]["email"], serde_json::json!(hospital_auth.user.email));

        // Unfiltered listing includes the admin and both registrations
        let response = server.get("/api/v1/users").authorization_bearer(&admin_token).await;
        response.assert_status_ok();
        let users: serde_json::Value = response.json();
        assert_eq!(users.as_array().unwrap().len(), 3);

        // The directory is admin-only
        let response = server.get("/api/v1/users").authorization_bearer(&patient.token).await;
        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_restock_and_availability_search(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;

        let patient = register_patient(&server).await;
        let hospital_auth = register_hospital(&server).await;
        let hospital_id = verify_and_stock(&pool, hospital_auth.user.id, BloodType::ONegative, 0).await;

        let response = server
            .post("/api/v1/inventory/restock")
            .authorization_bearer(&hospital_auth.token)
            .json(&serde_json::json!({ "blood_type": "O-", "units": 7 }))
            .await;
        response.assert_status_ok();
        let line: serde_json::Value = response.json();
        assert_eq!(line["units_available"], 7);

        // Oversized deliveries are rejected before they reach the ledger
        let response = server
            .post("/api/v1/inventory/restock")
            .authorization_bearer(&hospital_auth.token)
            .json(&serde_json::json!({ "blood_type": "O-", "units": 100_000 }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["error"], "validation_error");
        assert_eq!(ledger_line(&pool, hospital_id, BloodType::ONegative).await, (7, 0));

        // Any authenticated user can search availability
        let response = server
            .get("/api/v1/availability")
            .authorization_bearer(&patient.token)
            .add_query_param("blood_type", "O-")
            .add_query_param("min_units", "5")
            .await;
        response.assert_status_ok();
        let hits: serde_json::Value = response.json();
        assert_eq!(hits.as_array().unwrap().len(), 1);
        assert_eq!(hits[0]["hospital_id"], serde_json::json!(hospital_id));

        // Threshold above stock finds nothing
        let response = server
            .get("/api/v1/availability")
            .authorization_bearer(&patient.token)
            .add_query_param("blood_type", "O-")
            .add_query_param("min_units", "8")
            .await;
        response.assert_status_ok();
        let hits: serde_json::Value = response.json();
        assert!(hits.as_array().unwrap().is_empty());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_activity_log_records_admission(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;

        let admin_token = login_admin(&server).await;
        let patient = register_patient(&server).await;
        let hospital_auth = register_hospital(&server).await;
        let hospital_id = verify_and_stock(&pool, hospital_auth.user.id, BloodType::ONegative, 5).await;

        let response = server
            .post("/api/v1/requests")
            .authorization_bearer(&patient.token)
            .json(&serde_json::json!({
                "hospital_id": hospital_id,
                "blood_type": "O-",
                "units_requested": 1,
                "priority": "routine"
            }))
            .await;
        response.assert_status(StatusCode::CREATED);

        // Only admins may read the feed
        let response = server
            .get("/api/v1/activity")
            .authorization_bearer(&hospital_auth.token)
            .await;
        response.assert_status(StatusCode::FORBIDDEN);

        // Recording is spawned after commit; poll briefly before asserting
        let mut entries = serde_json::Value::Null;
        for _ in 0..50 {
            let response = server.get("/api/v1/activity").authorization_bearer(&admin_token).await;
            response.assert_status_ok();
            entries = response.json();
            if entries
                .as_array()
                .unwrap()
                .iter()
                .any(|e| e["action"] == "request.submitted")
            {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }

        let entry = entries
            .as_array()
            .unwrap()
            .iter()
            .find(|e| e["action"] == "request.submitted")
            .expect("admission should be recorded");
        assert_eq!(entry["entity_type"], "blood_request");
        assert_eq!(entry["new_values"]["units_requested"], 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_notifications_delivered_after_admission(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;

        let patient = register_patient(&server).await;
        let hospital_auth = register_hospital(&server).await;
        let hospital_id = verify_and_stock(&pool, hospital_auth.user.id, BloodType::ONegative, 5).await;

        let response = server
            .post("/api/v1/requests")
            .authorization_bearer(&patient.token)
            .json(&serde_json::json!({
                "hospital_id": hospital_id,
                "blood_type": "O-",
                "units_requested": 1,
                "priority": "emergency"
            }))
            .await;
        response.assert_status(StatusCode::CREATED);

        // Delivery is spawned after commit; poll briefly before asserting
        let mut notifications = serde_json::Value::Null;
        for _ in 0..50 {
            let response = server
                .get("/api/v1/notifications")
                .authorization_bearer(&hospital_auth.token)
                .await;
            response.assert_status_ok();
            notifications = response.json();
            if !notifications.as_array().unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }

        let list = notifications.as_array().expect("notification list");
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["priority"], "critical");
        assert_eq!(list[0]["is_read"], false);

        // Mark it read
        let notification_id = list[0]["id"].as_str().unwrap();
        let response = server
            .post(&format!("/api/v1/notifications/{notification_id}/read"))
            .authorization_bearer(&hospital_auth.token)
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["is_read"], true);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_notification_list_pagination(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;

        let patient = register_patient(&server).await;
        let hospital_auth = register_hospital(&server).await;
        let hospital_id = verify_and_stock(&pool, hospital_auth.user.id, BloodType::ONegative, 5).await;

        // Two admissions produce two notifications for the hospital
        for _ in 0..2 {
            let response = server
                .post("/api/v1/requests")
                .authorization_bearer(&patient.token)
                .json(&serde_json::json!({
                    "hospital_id": hospital_id,
                    "blood_type": "O-",
                    "units_requested": 1,
                    "priority": "routine"
                }))
                .await;
            response.assert_status(StatusCode::CREATED);
        }

        // Delivery is spawned after commit; poll until both have landed
        let mut all = serde_json::Value::Null;
        for _ in 0..50 {
            let response = server
                .get("/api/v1/notifications")
                .authorization_bearer(&hospital_auth.token)
                .await;
            response.assert_status_ok();
            all = response.json();
            if all.as_array().unwrap().len() == 2 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        assert_eq!(all.as_array().unwrap().len(), 2);

        async fn page(server: &axum_test::TestServer, token: &str, skip: i64) -> Vec<serde_json::Value> {
            let response = server
                .get("/api/v1/notifications")
                .authorization_bearer(token)
                .add_query_param("limit", "1")
                .add_query_param("skip", skip.to_string())
                .await;
            response.assert_status_ok();
            let body: serde_json::Value = response.json();
            body.as_array().unwrap().clone()
        }

        // skip walks through the list one page at a time
        let first = page(&server, &hospital_auth.token, 0).await;
        let second = page(&server, &hospital_auth.token, 1).await;
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert_ne!(first[0]["id"], second[0]["id"]);
        assert!(page(&server, &hospital_auth.token, 2).await.is_empty());
    }
}
