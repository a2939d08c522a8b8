//! Request extractors shared by authenticated routes.

pub mod auth;

pub use auth::AuthUser;
