//! In-memory store backends
//!
//! Used by the test suite and by `launchpad-server` when no `DATABASE_URL`
//! is configured. Same contract as the PostgreSQL backends, including the
//! most-recent-only lookup and tolerant consume.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;

use super::{ChallengeStore, StoreError, UserDirectory};
use crate::models::{Challenge, User};

/// Challenge store over a mutex-guarded vec, insertion order = creation order.
pub struct MemoryChallengeStore {
    ttl: Duration,
    records: Mutex<Vec<Challenge>>,
}

impl MemoryChallengeStore {
    pub fn new(ttl_seconds: i64) -> Self {
        Self {
            ttl: Duration::seconds(ttl_seconds),
            records: Mutex::new(Vec::new()),
        }
    }

    /// Number of records currently held, expired ones included.
    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ChallengeStore for MemoryChallengeStore {
    async fn issue(&self, wallet_address: &str) -> Result<Challenge, StoreError> {
        let challenge = Challenge::new(wallet_address, self.ttl);
        self.records.lock().unwrap().push(challenge.clone());
        Ok(challenge)
    }

    async fn most_recent_for(
        &self,
        wallet_address: &str,
    ) -> Result<Option<Challenge>, StoreError> {
        let records = self.records.lock().unwrap();
        Ok(records
            .iter()
            .rev()
            .find(|c| c.wallet_address == wallet_address && !c.is_expired())
            .cloned())
    }

    async fn consume(&self, id: Uuid) -> Result<(), StoreError> {
        self.records.lock().unwrap().retain(|c| c.id != id);
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64, StoreError> {
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        let now = Utc::now();
        records.retain(|c| c.expires_at > now);
        Ok((before - records.len()) as u64)
    }
}

/// User directory over a mutex-guarded vec.
#[derive(Default)]
pub struct MemoryUserDirectory {
    users: Mutex<Vec<User>>,
}

impl MemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove a user by address. Test hook for the deleted-user token path.
    pub fn remove(&self, wallet_address: &str) {
        self.users
            .lock()
            .unwrap()
            .retain(|u| u.wallet_address != wallet_address);
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn find_by_address(&self, wallet_address: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .find(|u| u.wallet_address == wallet_address)
            .cloned())
    }

    async fn find_or_create(&self, wallet_address: &str) -> Result<User, StoreError> {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter().find(|u| u.wallet_address == wallet_address) {
            return Ok(user.clone());
        }

        let user = User::new(wallet_address);
        users.push(user.clone());
        Ok(user)
    }
}
