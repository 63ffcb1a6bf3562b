//! Core traits for sign-in and web-service access.

mod authenticator;
mod web_service;

pub use authenticator::Authenticator;
pub use web_service::WebService;
