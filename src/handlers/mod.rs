//! HTTP request handlers outside the auth module.

pub mod http;

pub use http::*;
