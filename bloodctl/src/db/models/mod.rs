pub mod activity_logs;
pub mod blood_requests;
pub mod donation_offers;
pub mod donors;
pub mod hospitals;
pub mod inventory;
pub mod notifications;
pub mod patients;
pub mod users;
