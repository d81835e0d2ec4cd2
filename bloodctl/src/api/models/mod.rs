//! API request/response models.

pub mod activity;
pub mod hospitals;
pub mod inventory;
pub mod notifications;
pub mod offers;
pub mod pagination;
pub mod requests;
pub mod users;
