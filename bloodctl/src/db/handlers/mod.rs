//! Database repositories.
//!
//! Each repository wraps a `&mut PgConnection`, so callers decide whether a
//! group of operations shares a transaction. Multi-step mutations (admission,
//! disposition, offer submission) always run inside one transaction owned by
//! the handler.

pub mod activity_logs;
pub mod blood_requests;
pub mod donation_offers;
pub mod donors;
pub mod hospitals;
pub mod inventory;
pub mod notifications;
pub mod patients;
pub mod repository;
pub mod users;

pub use activity_logs::ActivityLogs;
pub use blood_requests::BloodRequests;
pub use donation_offers::DonationOffers;
pub use donors::Donors;
pub use hospitals::Hospitals;
pub use inventory::Inventory;
pub use notifications::Notifications;
pub use patients::Patients;
pub use repository::Repository;
pub use users::Users;
