//! HTTP handlers, grouped by resource.

pub mod activity;
pub mod auth;
pub mod hospitals;
pub mod inventory;
pub mod notifications;
pub mod offers;
pub mod requests;
pub mod users;

use chrono::{Datelike, Utc};
use rand::Rng;

/// Generate a human-readable reference code, e.g. "REQ-2026-483920".
/// Uniqueness is enforced by the database; the random suffix keeps collisions
/// rare enough that a retry is not worth the code.
pub(crate) fn generate_code(prefix: &str) -> String {
    let year = Utc::now().year();
    let suffix: u32 = rand::rng().random_range(0..1_000_000);
    format!("{prefix}-{year}-{suffix:06}")
}
