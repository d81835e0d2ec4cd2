//! API request/response models for users and authentication.

use crate::db::models::users::UserDBResponse;
use crate::types::{BloodType, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Role enum for the different kinds of account.
///
/// This set is closed: registration only accepts patient, donor, and
/// hospital; the admin account is provisioned at startup.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Patient,
    Donor,
    Hospital,
    Admin,
}

/// Role-specific profile data supplied at registration. The `role` tag picks
/// the variant and decides which profile row gets created.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum RoleProfile {
    Patient {
        date_of_birth: Option<NaiveDate>,
        blood_type: Option<BloodType>,
        phone: Option<String>,
    },
    Donor {
        blood_type: BloodType,
        date_of_birth: Option<NaiveDate>,
        weight_kg: Option<i32>,
    },
    Hospital {
        name: String,
        address: String,
        city: String,
        phone: Option<String>,
        license_number: String,
    },
}

impl RoleProfile {
    pub fn role(&self) -> Role {
        match self {
            RoleProfile::Patient { .. } => Role::Patient,
            RoleProfile::Donor { .. } => Role::Donor,
            RoleProfile::Hospital { .. } => Role::Hospital,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(flatten)]
    pub profile: RoleProfile,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<UserDBResponse> for UserResponse {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            email: db.email,
            first_name: db.first_name,
            last_name: db.last_name,
            role: db.role,
            is_active: db.is_active,
            created_at: db.created_at,
        }
    }
}

/// Query parameters for the admin user directory.
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ListUsersQuery {
    pub role: Option<Role>,
}

/// The authenticated principal extracted from a session token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrentUser {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub email: String,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_format() {
        assert_eq!(serde_json::to_string(&Role::Patient).unwrap(), "\"patient\"");
        assert_eq!(serde_json::to_string(&Role::Hospital).unwrap(), "\"hospital\"");
        assert_eq!(serde_json::from_str::<Role>("\"donor\"").unwrap(), Role::Donor);
        // The role set is closed
        assert!(serde_json::from_str::<Role>("\"superuser\"").is_err());
    }

    #[test]
    fn test_register_request_tagged_profile() {
        let json = serde_json::json!({
            "email": "donor@example.com",
            "password": "hunter2hunter2",
            "first_name": "Dana",
            "last_name": "Ortiz",
            "role": "donor",
            "blood_type": "O-",
            "weight_kg": 70
        });

        let request: RegisterRequest = serde_json::from_value(json).unwrap();
        assert_eq!(request.profile.role(), Role::Donor);
        match request.profile {
            RoleProfile::Donor { blood_type, weight_kg, .. } => {
                assert_eq!(blood_type, BloodType::ONegative);
                assert_eq!(weight_kg, Some(70));
            }
            other => panic!("expected donor profile, got {other:?}"),
        }
    }

    #[test]
    fn test_register_request_rejects_admin_role() {
        let json = serde_json::json!({
            "email": "evil@example.com",
            "password": "hunter2hunter2",
            "first_name": "Eve",
            "last_name": "Adams",
            "role": "admin"
        });

        assert!(serde_json::from_value::<RegisterRequest>(json).is_err());
    }
}
