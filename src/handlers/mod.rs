pub mod admin;
pub mod alert;
pub mod auth;
pub mod user;
pub mod vote;

pub use auth::*;
