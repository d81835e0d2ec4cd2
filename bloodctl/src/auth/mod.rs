//! Authentication: password hashing, JWT sessions, and the current-user
//! extractor.

pub mod current_user;
pub mod password;
pub mod session;
