use crate::{
    AppState,
    api::models::users::{CurrentUser, Role},
    auth::session,
    errors::{Error, Result},
};
use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::{debug, instrument, trace};

/// Extract user from a Bearer session token in the Authorization header.
/// Returns:
/// - None: No Authorization header or not a Bearer token
/// - Some(Ok(user)): Valid token found and verified
/// - Some(Err(error)): Bearer token present but invalid
#[instrument(skip(parts, config))]
fn try_bearer_auth(parts: &Parts, config: &crate::config::Config) -> Option<Result<CurrentUser>> {
    let auth_header = parts.headers.get(axum::http::header::AUTHORIZATION)?;

    let auth_str = match auth_header.to_str() {
        Ok(s) => s,
        Err(e) => {
            return Some(Err(Error::BadRequest {
                message: format!("Invalid authorization header: {e}"),
            }));
        }
    };

    let token = auth_str.strip_prefix("Bearer ")?;

    Some(session::verify_session_token(token, config))
}

/// Extract user from the JWT session cookie if present and valid.
/// Returns:
/// - None: No session cookie present (or the token inside it is invalid)
/// - Some(Ok(user)): Valid JWT found and verified
/// - Some(Err(error)): Cookie header present but unreadable
#[instrument(skip(parts, config))]
fn try_session_cookie_auth(parts: &Parts, config: &crate::config::Config) -> Option<Result<CurrentUser>> {
    let cookie_header = parts.headers.get(axum::http::header::COOKIE)?;

    let cookie_str = match cookie_header.to_str() {
        Ok(s) => s,
        Err(e) => {
            return Some(Err(Error::BadRequest {
                message: format!("Invalid cookie header: {e}"),
            }));
        }
    };
    let cookie_name = &config.auth.session_cookie_name;

    for cookie in cookie_str.split(';') {
        let cookie = cookie.trim();
        if let Some((name, value)) = cookie.split_once('=') {
            if name == cookie_name {
                match session::verify_session_token(value, config) {
                    Ok(user) => return Some(Ok(user)),
                    Err(_) => {
                        // Expired or invalid tokens in cookies are routine, keep looking
                        continue;
                    }
                }
            }
        }
    }
    None
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        // Try all authentication methods and return the first success. Each
        // method returns Option<Result<CurrentUser>>: None means the method
        // was not attempted (no credentials present), Some(Err) means
        // credentials were present but invalid.

        match try_bearer_auth(parts, &state.config) {
            Some(Ok(user)) => {
                debug!("Found bearer token authenticated user: {}", user.id);
                return Ok(user);
            }
            Some(Err(e)) => {
                trace!("Bearer token authentication failed: {:?}", e);
            }
            None => {
                trace!("No bearer token authentication attempted");
            }
        }

        match try_session_cookie_auth(parts, &state.config) {
            Some(Ok(user)) => {
                debug!("Found session cookie authenticated user: {}", user.id);
                return Ok(user);
            }
            Some(Err(e)) => {
                trace!("Session cookie authentication failed: {:?}", e);
            }
            None => {
                trace!("No session cookie authentication attempted");
            }
        }

        Err(Error::Unauthenticated { message: None })
    }
}

/// Require the current user to hold a specific role. Admins pass every check.
pub fn require_role(user: &CurrentUser, role: Role, resource: &str) -> Result<()> {
    if user.role == role || user.role == Role::Admin {
        Ok(())
    } else {
        Err(Error::Forbidden {
            action: format!("access as {role:?}"),
            resource: resource.to_string(),
        })
    }
}

/// Require the current user to be an admin.
pub fn require_admin(user: &CurrentUser, resource: &str) -> Result<()> {
    if user.role == Role::Admin {
        Ok(())
    } else {
        Err(Error::Forbidden {
            action: "administer".to_string(),
            resource: resource.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_config;
    use axum::extract::FromRequestParts as _;
    use sqlx::PgPool;
    use uuid::Uuid;

    fn create_test_parts_with_header(header_name: &str, header_value: &str) -> Parts {
        let request = axum::http::Request::builder()
            .uri("http://localhost/test")
            .header(header_name, header_value)
            .body(())
            .unwrap();

        let (parts, _body) = request.into_parts();
        parts
    }

    #[sqlx::test]
    async fn test_bearer_token_extraction(pool: PgPool) {
        let config = create_test_config();
        let user = CurrentUser {
            id: Uuid::new_v4(),
            email: "patient@example.com".to_string(),
            role: Role::Patient,
        };
        let token = session::create_session_token(&user, &config).unwrap();
        let state = AppState::builder().db(pool).config(config).build();

        let mut parts = create_test_parts_with_header("authorization", &format!("Bearer {token}"));

        let result = CurrentUser::from_request_parts(&mut parts, &state).await;
        assert!(result.is_ok());

        let current_user = result.unwrap();
        assert_eq!(current_user.id, user.id);
        assert_eq!(current_user.email, user.email);
        assert_eq!(current_user.role, Role::Patient);
    }

    #[sqlx::test]
    async fn test_session_cookie_extraction(pool: PgPool) {
        let config = create_test_config();
        let user = CurrentUser {
            id: Uuid::new_v4(),
            email: "donor@example.com".to_string(),
            role: Role::Donor,
        };
        let token = session::create_session_token(&user, &config).unwrap();
        let cookie = format!("{}={token}", config.auth.session_cookie_name);
        let state = AppState::builder().db(pool).config(config).build();

        let mut parts = create_test_parts_with_header("cookie", &cookie);

        let result = CurrentUser::from_request_parts(&mut parts, &state).await;
        assert!(result.is_ok());
        assert_eq!(result.unwrap().role, Role::Donor);
    }

    #[sqlx::test]
    async fn test_missing_credentials_returns_unauthorized(pool: PgPool) {
        let config = create_test_config();
        let state = AppState::builder().db(pool).config(config).build();

        let request = axum::http::Request::builder().uri("http://localhost/test").body(()).unwrap();
        let (mut parts, _body) = request.into_parts();

        let result = CurrentUser::from_request_parts(&mut parts, &state).await;
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().status_code(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    async fn test_garbage_bearer_token_rejected(pool: PgPool) {
        let config = create_test_config();
        let state = AppState::builder().db(pool).config(config).build();

        let mut parts = create_test_parts_with_header("authorization", "Bearer not.a.token");

        let result = CurrentUser::from_request_parts(&mut parts, &state).await;
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().status_code(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_require_role() {
        let patient = CurrentUser {
            id: Uuid::new_v4(),
            email: "patient@example.com".to_string(),
            role: Role::Patient,
        };
        assert!(require_role(&patient, Role::Patient, "blood requests").is_ok());

        let err = require_role(&patient, Role::Hospital, "inventory").unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::FORBIDDEN);

        // Admins pass role checks
        let admin = CurrentUser {
            id: Uuid::new_v4(),
            email: "admin@example.com".to_string(),
            role: Role::Admin,
        };
        assert!(require_role(&admin, Role::Hospital, "inventory").is_ok());
        assert!(require_admin(&admin, "hospitals").is_ok());
        assert!(require_admin(&patient, "hospitals").is_err());
    }
}
