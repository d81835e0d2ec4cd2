//! Common type definitions shared between the API and database layers.
//!
//! This module defines:
//! - Type aliases for entity IDs (UserId, HospitalId, etc.)
//! - Domain enums stored as PostgreSQL enum types (blood type, priority, statuses)
//!
//! All entity IDs are UUIDs wrapped in type aliases for better type safety.

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

// Type aliases for IDs
pub type UserId = Uuid;
pub type HospitalId = Uuid;
pub type PatientId = Uuid;
pub type DonorId = Uuid;
pub type InventoryLineId = Uuid;
pub type BloodRequestId = Uuid;
pub type DonationOfferId = Uuid;
pub type NotificationId = Uuid;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

/// The eight ABO/Rh blood types, stored as a PostgreSQL enum.
///
/// Wire format matches the clinical notation ("A+", "O-", ...) in both JSON
/// and the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "blood_type")]
pub enum BloodType {
    #[serde(rename = "A+")]
    #[sqlx(rename = "A+")]
    APositive,
    #[serde(rename = "A-")]
    #[sqlx(rename = "A-")]
    ANegative,
    #[serde(rename = "B+")]
    #[sqlx(rename = "B+")]
    BPositive,
    #[serde(rename = "B-")]
    #[sqlx(rename = "B-")]
    BNegative,
    #[serde(rename = "AB+")]
    #[sqlx(rename = "AB+")]
    AbPositive,
    #[serde(rename = "AB-")]
    #[sqlx(rename = "AB-")]
    AbNegative,
    #[serde(rename = "O+")]
    #[sqlx(rename = "O+")]
    OPositive,
    #[serde(rename = "O-")]
    #[sqlx(rename = "O-")]
    ONegative,
}

impl BloodType {
    /// All blood types, in ledger seeding order.
    pub const ALL: [BloodType; 8] = [
        BloodType::APositive,
        BloodType::ANegative,
        BloodType::BPositive,
        BloodType::BNegative,
        BloodType::AbPositive,
        BloodType::AbNegative,
        BloodType::OPositive,
        BloodType::ONegative,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BloodType::APositive => "A+",
            BloodType::ANegative => "A-",
            BloodType::BPositive => "B+",
            BloodType::BNegative => "B-",
            BloodType::AbPositive => "AB+",
            BloodType::AbNegative => "AB-",
            BloodType::OPositive => "O+",
            BloodType::ONegative => "O-",
        }
    }
}

impl fmt::Display for BloodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Urgency of a blood request. Drives the estimated response time quoted to
/// the patient and the priority of the notification sent to the hospital.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "request_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Routine,
    Urgent,
    Emergency,
}

impl Priority {
    /// Human-readable response time quoted to the patient at submission.
    pub fn estimated_response_time(&self) -> &'static str {
        match self {
            Priority::Emergency => "15 minutes",
            Priority::Urgent => "2 hours",
            Priority::Routine => "24 hours",
        }
    }

    /// Notification priority for the hospital alert.
    pub fn notification_priority(&self) -> NotificationPriority {
        match self {
            Priority::Emergency => NotificationPriority::Critical,
            Priority::Urgent => NotificationPriority::High,
            Priority::Routine => NotificationPriority::Normal,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Routine => write!(f, "routine"),
            Priority::Urgent => write!(f, "urgent"),
            Priority::Emergency => write!(f, "emergency"),
        }
    }
}

/// Lifecycle of a blood request. Disposition moves pending -> approved or
/// pending -> rejected exactly once; completion moves approved -> completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "request_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
}

/// Lifecycle of a donation offer. Disposition moves pending -> accepted or
/// pending -> rejected exactly once; completion moves accepted -> completed
/// when the collection happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "offer_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OfferStatus {
    Pending,
    Accepted,
    Rejected,
    Completed,
}

/// Priority of an in-app notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "notification_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    Normal,
    High,
    Critical,
}
