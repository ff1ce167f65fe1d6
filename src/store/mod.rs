//! Persistence interfaces for challenges and users
//!
//! The authenticator only ever talks to these traits; the concrete backend
//! (PostgreSQL in production, in-memory for tests and database-less dev
//! runs) is injected at construction.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Challenge, User};

mod memory;
mod pg;

pub use memory::{MemoryChallengeStore, MemoryUserDirectory};
pub use pg::{PgChallengeStore, PgUserDirectory};

/// Store backend failure
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Backend(e.to_string())
    }
}

/// Address-indexed storage of outstanding challenges with TTL expiry.
#[async_trait]
pub trait ChallengeStore: Send + Sync {
    /// Generate and persist a fresh challenge for the address.
    ///
    /// Outstanding challenges for the same address are left untouched, so a
    /// user with several open tabs can hold several live challenges at once.
    async fn issue(&self, wallet_address: &str) -> Result<Challenge, StoreError>;

    /// Latest unexpired challenge for the address, by creation order.
    ///
    /// Older outstanding challenges are never returned here; issuing a new
    /// challenge makes them unusable even before the reaper deletes them.
    async fn most_recent_for(&self, wallet_address: &str)
        -> Result<Option<Challenge>, StoreError>;

    /// Delete a challenge by id. Deleting an id that is already gone is Ok.
    async fn consume(&self, id: Uuid) -> Result<(), StoreError>;

    /// Delete every expired challenge, returning how many were removed.
    async fn purge_expired(&self) -> Result<u64, StoreError>;
}

/// User records keyed by wallet address.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_address(&self, wallet_address: &str) -> Result<Option<User>, StoreError>;

    /// Find the user for an address, inserting a fresh record if absent.
    ///
    /// Existing records are never modified by this call.
    async fn find_or_create(&self, wallet_address: &str) -> Result<User, StoreError>;
}

/// Background sweep deleting expired challenges.
///
/// Runs until the task is dropped at shutdown. A failed sweep is logged and
/// retried on the next tick; expired challenges are already unusable through
/// `most_recent_for`, the sweep only reclaims storage.
pub async fn challenge_reaper(store: Arc<dyn ChallengeStore>, every: Duration) {
    tracing::info!(interval_secs = every.as_secs(), "Challenge reaper started");

    let mut ticker = tokio::time::interval(every);
    // The first tick fires immediately; skip it so startup is not a sweep.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        match store.purge_expired().await {
            Ok(0) => {}
            Ok(removed) => tracing::debug!(removed, "Purged expired challenges"),
            Err(e) => tracing::error!("Challenge reaper sweep failed: {}", e),
        }
    }
}
