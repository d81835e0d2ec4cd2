//! Test utilities for integration testing
use crate::api::models::users::AuthResponse;
use crate::config::{Config, PasswordConfig};
use crate::db::handlers::{Hospitals, Inventory};
use crate::types::{BloodType, HospitalId, UserId};
use axum_test::TestServer;
use sqlx::PgPool;
use uuid::Uuid;

pub const TEST_ADMIN_EMAIL: &str = "admin@test.com";
pub const TEST_ADMIN_PASSWORD: &str = "admin-test-password";

pub fn create_test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url: None,
        database: crate::config::DatabaseConfig::default(),
        admin_email: TEST_ADMIN_EMAIL.to_string(),
        admin_password: Some(TEST_ADMIN_PASSWORD.to_string()),
        secret_key: Some("test-secret-key-for-testing-only".to_string()),
        auth: crate::config::AuthConfig {
            password: PasswordConfig {
                min_length: 8,
                max_length: 64,
                // Ultra-weak params for fast testing (DO NOT USE IN PRODUCTION)
                argon2_memory_kib: 128, // 128 KB (vs 19 MB production)
                argon2_iterations: 1,   // 1 iteration (vs 2 production)
                argon2_parallelism: 1,  // 1 thread
            },
            ..Default::default()
        },
    }
}

pub async fn create_test_app(pool: PgPool) -> TestServer {
    let config = create_test_config();

    let app = crate::Application::new_with_pool(config, Some(pool))
        .await
        .expect("Failed to create application");

    app.into_test_server()
}

/// Register a patient account through the API, returning the session token and user
pub async fn register_patient(server: &TestServer) -> AuthResponse {
    let suffix = Uuid::new_v4().simple().to_string();
    let response = server
        .post("/authentication/register")
        .json(&serde_json::json!({
            "email": format!("patient_{suffix}@example.com"),
            "password": "patient-password",
            "first_name": "Pat",
            "last_name": "Test",
            "role": "patient",
            "blood_type": "O-"
        }))
        .await;

    response.assert_status(axum::http::StatusCode::CREATED);
    response.json()
}

/// Register an eligible donor account through the API
pub async fn register_donor(server: &TestServer) -> AuthResponse {
    let suffix = Uuid::new_v4().simple().to_string();
    let response = server
        .post("/authentication/register")
        .json(&serde_json::json!({
            "email": format!("donor_{suffix}@example.com"),
            "password": "donor-password",
            "first_name": "Don",
            "last_name": "Test",
            "role": "donor",
            "blood_type": "O-",
            "weight_kg": 75
        }))
        .await;

    response.assert_status(axum::http::StatusCode::CREATED);
    response.json()
}

/// Register a hospital account through the API. The hospital starts unverified.
pub async fn register_hospital(server: &TestServer) -> AuthResponse {
    let suffix = Uuid::new_v4().simple().to_string();
    let response = server
        .post("/authentication/register")
        .json(&serde_json::json!({
            "email": format!("hospital_{suffix}@example.com"),
            "password": "hospital-password",
            "first_name": "Hope",
            "last_name": "Admin",
            "role": "hospital",
            "name": format!("Test General {suffix}"),
            "address": "1 Test Way",
            "city": "Testville",
            "license_number": format!("LIC-{suffix}")
        }))
        .await;

    response.assert_status(axum::http::StatusCode::CREATED);
    response.json()
}

/// Login as the admin provisioned at application startup, returning its token
pub async fn login_admin(server: &TestServer) -> String {
    let response = server
        .post("/authentication/login")
        .json(&serde_json::json!({
            "email": TEST_ADMIN_EMAIL,
            "password": TEST_ADMIN_PASSWORD,
        }))
        .await;

    response.assert_status_ok();
    let auth: AuthResponse = response.json();
    auth.token
}

/// Flag a donor as ineligible, as a screening step would
pub async fn mark_donor_ineligible(pool: &PgPool, user_id: UserId) {
    sqlx::query("UPDATE donors SET is_eligible = FALSE WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await
        .expect("Failed to update donor eligibility");
}

/// Look up the hospital profile created at registration for a user
pub async fn hospital_profile_id(pool: &PgPool, user_id: UserId) -> HospitalId {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    Hospitals::new(&mut conn)
        .get_by_user_id(user_id)
        .await
        .expect("Failed to look up hospital")
        .expect("Hospital profile should exist")
        .id
}

/// Verify a hospital directly in the database, seed its ledger, and optionally
/// stock one blood type. Returns the hospital ID.
pub async fn verify_and_stock(pool: &PgPool, user_id: UserId, blood_type: BloodType, units: i32) -> HospitalId {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");

    let hospital_id = {
        let mut hospitals = Hospitals::new(&mut conn);
        let hospital = hospitals
            .get_by_user_id(user_id)
            .await
            .expect("Failed to look up hospital")
            .expect("Hospital profile should exist");
        hospitals
            .verify(hospital.id)
            .await
            .expect("Failed to verify hospital")
            .expect("Hospital should have been pending");
        hospital.id
    };

    let mut inventory = Inventory::new(&mut conn);
    inventory.seed_hospital(hospital_id).await.expect("Failed to seed ledger");
    if units > 0 {
        inventory
            .restock(hospital_id, blood_type, units)
            .await
            .expect("Failed to restock")
            .expect("Ledger line should exist after seeding");
    }

    hospital_id
}
