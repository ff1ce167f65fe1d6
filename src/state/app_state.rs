//! Application state shared across handlers

use std::sync::Arc;

use axum::extract::FromRef;

use crate::auth::{AuthService, TokenIssuer};
use crate::db::Database;
use crate::store::UserDirectory;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub token_issuer: Arc<TokenIssuer>,
    pub users: Arc<dyn UserDirectory>,
    /// Present when running against PostgreSQL; `None` on the in-memory
    /// profile.
    pub db: Option<Database>,
}

impl AppState {
    pub fn new(
        auth_service: Arc<AuthService>,
        token_issuer: Arc<TokenIssuer>,
        users: Arc<dyn UserDirectory>,
        db: Option<Database>,
    ) -> Self {
        Self {
            auth_service,
            token_issuer,
            users,
            db,
        }
    }
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.auth_service.clone()
    }
}

impl FromRef<AppState> for Arc<TokenIssuer> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.token_issuer.clone()
    }
}

impl FromRef<AppState> for Arc<dyn UserDirectory> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.users.clone()
    }
}
