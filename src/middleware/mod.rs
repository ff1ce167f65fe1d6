//! Middleware for the launchpad API
//!
//! Request tracing, security headers, and bearer-token authentication.

pub mod auth;
mod security;
mod tracing;

pub use auth::AuthenticatedUser;
pub use security::security_headers;
pub use tracing::request_tracing;
