//! PostgreSQL-backed challenge and user stores

use async_trait::async_trait;
use chrono::Duration;
use sqlx::PgPool;
use uuid::Uuid;

use super::{ChallengeStore, StoreError, UserDirectory};
use crate::models::{Challenge, User};

/// Challenge store over the `auth_challenges` table.
#[derive(Clone)]
pub struct PgChallengeStore {
    pool: PgPool,
    ttl: Duration,
}

impl PgChallengeStore {
    pub fn new(pool: PgPool, ttl_seconds: i64) -> Self {
        Self {
            pool,
            ttl: Duration::seconds(ttl_seconds),
        }
    }
}

#[async_trait]
impl ChallengeStore for PgChallengeStore {
    async fn issue(&self, wallet_address: &str) -> Result<Challenge, StoreError> {
        let challenge = Challenge::new(wallet_address, self.ttl);

        sqlx::query(
            r#"
            INSERT INTO auth_challenges (id, wallet_address, nonce, challenge_text, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(challenge.id)
        .bind(&challenge.wallet_address)
        .bind(&challenge.nonce)
        .bind(&challenge.challenge_text)
        .bind(challenge.created_at)
        .bind(challenge.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(challenge)
    }

    async fn most_recent_for(
        &self,
        wallet_address: &str,
    ) -> Result<Option<Challenge>, StoreError> {
        let challenge: Option<Challenge> = sqlx::query_as(
            r#"
            SELECT id, wallet_address, nonce, challenge_text, created_at, expires_at
            FROM auth_challenges
            WHERE wallet_address = $1 AND expires_at > NOW()
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(wallet_address)
        .fetch_optional(&self.pool)
        .await?;

        Ok(challenge)
    }

    async fn consume(&self, id: Uuid) -> Result<(), StoreError> {
        // Zero rows affected means another request got there first; that is
        // not an error for the caller.
        sqlx::query(
            r#"
            DELETE FROM auth_challenges WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            DELETE FROM auth_challenges WHERE expires_at <= NOW()
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

/// User directory over the `users` table.
#[derive(Clone)]
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_by_address(&self, wallet_address: &str) -> Result<Option<User>, StoreError> {
        let user: Option<User> = sqlx::query_as(
            r#"
            SELECT id, wallet_address, username, created_at
            FROM users
            WHERE wallet_address = $1
            "#,
        )
        .bind(wallet_address)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_or_create(&self, wallet_address: &str) -> Result<User, StoreError> {
        if let Some(user) = self.find_by_address(wallet_address).await? {
            return Ok(user);
        }

        // Two concurrent first logins can race on the unique index; the
        // loser's insert is a no-op and the re-select returns the winner's
        // row.
        let user = User::new(wallet_address);
        sqlx::query(
            r#"
            INSERT INTO users (id, wallet_address, username, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (wallet_address) DO NOTHING
            "#,
        )
        .bind(user.id)
        .bind(&user.wallet_address)
        .bind(&user.username)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        match self.find_by_address(wallet_address).await? {
            Some(user) => Ok(user),
            None => Err(StoreError::Backend(
                "user row missing after insert".to_string(),
            )),
        }
    }
}
