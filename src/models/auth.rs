//! Authentication models for the launchpad backend

use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::User;

/// Number of random bytes behind each challenge nonce.
const NONCE_BYTES: usize = 16;

/// Outstanding challenge for wallet authentication.
///
/// The record is immutable once created: it is either consumed (deleted) on
/// a successful verification or removed by the expiry reaper.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Challenge {
    pub id: Uuid,
    pub wallet_address: String,
    pub nonce: String,
    pub challenge_text: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Challenge {
    /// Build a fresh challenge for a wallet address.
    ///
    /// The nonce is sourced from the OS CSPRNG and hex-encoded; the
    /// challenge text embeds it verbatim and is the exact byte sequence the
    /// wallet must sign.
    pub fn new(wallet_address: &str, ttl: Duration) -> Self {
        let mut bytes = [0u8; NONCE_BYTES];
        OsRng.fill_bytes(&mut bytes);
        let nonce = hex::encode(bytes);

        let challenge_text =
            format!("Sign this message to authenticate with our app: {}", nonce);

        let created_at = Utc::now();

        Self {
            id: Uuid::new_v4(),
            wallet_address: wallet_address.to_string(),
            nonce,
            challenge_text,
            created_at,
            expires_at: created_at + ttl,
        }
    }

    /// Whether the challenge has passed its expiry instant.
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

// ============================================================================
// Request/Response DTOs
// ============================================================================

/// Request for an authentication challenge
#[derive(Debug, Deserialize, Validate)]
pub struct ChallengeRequest {
    #[validate(length(min = 1, message = "wallet_address must not be empty"))]
    pub wallet_address: String,
}

/// Response containing the authentication challenge
#[derive(Debug, Serialize)]
pub struct ChallengeResponse {
    pub challenge: String,
    pub nonce: String,
    pub expires_at: DateTime<Utc>,
}

impl From<Challenge> for ChallengeResponse {
    fn from(challenge: Challenge) -> Self {
        Self {
            challenge: challenge.challenge_text,
            nonce: challenge.nonce,
            expires_at: challenge.expires_at,
        }
    }
}

/// Request to verify a signed challenge
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub wallet_address: String,
    /// Base64-encoded ed25519 signature over `message`
    pub signature: String,
    /// The challenge text exactly as it was handed out
    pub message: String,
}

/// Bearer token response after successful verification
#[derive(Debug, Serialize)]
pub struct AuthTokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserResponse,
}

/// User response (sanitized for API)
#[derive(Debug, Serialize, Clone)]
pub struct UserResponse {
    pub id: Uuid,
    pub wallet_address: String,
    pub username: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            wallet_address: user.wallet_address,
            username: user.username,
            created_at: user.created_at,
        }
    }
}
