//! Registration, login, and the current-user endpoint.

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
};

use crate::{
    AppState,
    api::models::users::{AuthResponse, CurrentUser, LoginRequest, RegisterRequest, RoleProfile, UserResponse},
    auth::{password, session},
    db::{
        handlers::{Donors, Hospitals, Patients, Repository, Users},
        models::{
            donors::DonorCreateDBRequest,
            hospitals::HospitalCreateDBRequest,
            patients::PatientCreateDBRequest,
            users::UserCreateDBRequest,
        },
    },
    errors::Error,
};

fn create_session_cookie(token: &str, config: &crate::config::Config) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Strict; Max-Age={}",
        config.auth.session_cookie_name,
        token,
        config.auth.security.session_expiry.as_secs()
    )
}

/// Register a new patient, donor, or hospital account
#[utoipa::path(
    post,
    path = "/authentication/register",
    request_body = RegisterRequest,
    tag = "authentication",
    responses(
        (status = 201, description = "Account registered successfully", body = AuthResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Email or license number already registered"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, [(header::HeaderName, String); 1], Json<AuthResponse>), Error> {
    // Validate password length
    let password_config = &state.config.auth.password;
    if request.password.len() < password_config.min_length {
        return Err(Error::BadRequest {
            message: format!("Password must be at least {} characters", password_config.min_length),
        });
    }
    if request.password.len() > password_config.max_length {
        return Err(Error::BadRequest {
            message: format!("Password must be no more than {} characters", password_config.max_length),
        });
    }

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    // Check if a user with this email already exists
    let mut user_repo = Users::new(&mut tx);
    if user_repo.get_user_by_email(&request.email).await?.is_some() {
        return Err(Error::Conflict {
            message: "An account with this email address already exists".to_string(),
        });
    }

    // Hash the password on a blocking thread to avoid blocking the async runtime
    let password = request.password.clone();
    let params = password_config.argon2_params();
    let password_hash = tokio::task::spawn_blocking(move || password::hash_string_with_params(&password, Some(params)))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password hashing task: {e}"),
        })??;

    let create_request = UserCreateDBRequest {
        email: request.email,
        password_hash,
        first_name: request.first_name,
        last_name: request.last_name,
        role: request.profile.role(),
    };
    let created_user = user_repo.create(&create_request).await?;

    // Create the role-specific profile row
    match request.profile {
        RoleProfile::Patient {
            date_of_birth,
            blood_type,
            phone,
        } => {
            let mut patients = Patients::new(&mut tx);
            patients
                .create(&PatientCreateDBRequest {
                    user_id: created_user.id,
                    date_of_birth,
                    blood_type,
                    phone,
                })
                .await?;
        }
        RoleProfile::Donor {
            blood_type,
            date_of_birth,
            weight_kg,
        } => {
            let mut donors = Donors::new(&mut tx);
            donors
                .create(&DonorCreateDBRequest {
                    user_id: created_user.id,
                    blood_type,
                    date_of_birth,
                    weight_kg,
                })
                .await?;
        }
        RoleProfile::Hospital {
            name,
            address,
            city,
            phone,
            license_number,
        } => {
            // Hospitals start unverified; an admin verifies them later
            let mut hospitals = Hospitals::new(&mut tx);
            hospitals
                .create(&HospitalCreateDBRequest {
                    user_id: created_user.id,
                    name,
                    address,
                    city,
                    phone,
                    license_number,
                })
                .await?;
        }
    }

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    let user_response = UserResponse::from(created_user);
    let current_user = CurrentUser {
        id: user_response.id,
        email: user_response.email.clone(),
        role: user_response.role,
    };
    let token = session::create_session_token(&current_user, &state.config)?;
    let cookie = create_session_cookie(&token, &state.config);

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse {
            token,
            user: user_response,
        }),
    ))
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/authentication/login",
    request_body = LoginRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<([(header::HeaderName, String); 1], Json<AuthResponse>), Error> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut pool_conn);

    let user = user_repo
        .get_user_by_email(&request.email)
        .await?
        .ok_or_else(|| Error::Unauthenticated {
            message: Some("Invalid email or password".to_string()),
        })?;

    if !user.is_active {
        return Err(Error::Unauthenticated {
            message: Some("Account is deactivated".to_string()),
        });
    }

    // Verify password on a blocking thread to avoid blocking the async runtime
    let password = request.password.clone();
    let hash = user.password_hash.clone();
    let is_valid = tokio::task::spawn_blocking(move || password::verify_string(&password, &hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password verification task: {e}"),
        })??;

    if !is_valid {
        return Err(Error::Unauthenticated {
            message: Some("Invalid email or password".to_string()),
        });
    }

    let user_response = UserResponse::from(user);
    let current_user = CurrentUser {
        id: user_response.id,
        email: user_response.email.clone(),
        role: user_response.role,
    };
    let token = session::create_session_token(&current_user, &state.config)?;
    let cookie = create_session_cookie(&token, &state.config);

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse {
            token,
            user: user_response,
        }),
    ))
}

/// Get the authenticated user's account
#[utoipa::path(
    get,
    path = "/authentication/me",
    tag = "authentication",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Not authenticated"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn me(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<UserResponse>, Error> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut pool_conn);

    let user = user_repo.get_by_id(current_user.id).await?.ok_or_else(|| Error::NotFound {
        resource: "user".to_string(),
        id: current_user.id.to_string(),
    })?;

    Ok(Json(UserResponse::from(user)))
}
