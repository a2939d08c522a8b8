//! Authentication: password hashing, tokens, signup and login.

pub mod hasher;
pub mod jwt;
mod handlers;
mod service;

pub use handlers::{login, me, signup, LoginRequest, LoginResponse, SignupRequest, SignupResponse};
pub use hasher::CredentialHasher;
pub use jwt::{Claims, IssuedToken, TokenIssuer};
pub use service::AuthService;
