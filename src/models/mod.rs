//! Data models for the launchpad backend

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod auth;
pub use auth::*;

/// User model
///
/// Users are created lazily: the first successful signature verification for
/// a wallet address inserts the record, later logins reuse it untouched.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct User {
    pub id: Uuid,
    pub wallet_address: String,
    pub username: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Fresh user record for a wallet address, profile fields unset.
    pub fn new(wallet_address: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            wallet_address: wallet_address.to_string(),
            username: None,
            created_at: Utc::now(),
        }
    }
}
