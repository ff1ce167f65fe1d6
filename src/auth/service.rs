//! Authentication service
//!
//! The challenge/response state machine: issue a nonce challenge, check a
//! signature against the most recent outstanding challenge, start a session
//! lazily creating the user. Per-address state is implicit — it is whatever
//! the challenge store currently holds.

use std::sync::Arc;

use thiserror::Error;

use crate::models::{Challenge, User};
use crate::store::{ChallengeStore, StoreError, UserDirectory};

use super::crypto::SignatureVerifier;

/// Auth service errors — infrastructure failures only. Authentication
/// verdicts are `VerifyDecision`, never errors.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("invalid wallet address")]
    InvalidAddress,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Why a verification was rejected. Internal detail for logging; every
/// reason maps to the same external 401 so callers cannot probe whether an
/// address has an outstanding challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// No outstanding challenge: never issued, consumed, or expired.
    NoChallenge,
    /// Submitted message differs from the stored challenge text.
    MessageMismatch,
    /// Signature check failed or the verifier could not parse the input.
    SignatureInvalid,
}

/// Outcome of a verification attempt.
#[derive(Debug)]
pub enum VerifyDecision {
    Accepted(User),
    Rejected(RejectReason),
}

/// Wallet challenge/response authenticator.
///
/// All collaborators are injected; the service holds no state of its own
/// beyond the trait objects.
pub struct AuthService {
    challenges: Arc<dyn ChallengeStore>,
    users: Arc<dyn UserDirectory>,
    verifier: Arc<dyn SignatureVerifier>,
}

impl AuthService {
    pub fn new(
        challenges: Arc<dyn ChallengeStore>,
        users: Arc<dyn UserDirectory>,
        verifier: Arc<dyn SignatureVerifier>,
    ) -> Self {
        Self {
            challenges,
            users,
            verifier,
        }
    }

    /// Issue a fresh challenge for the wallet to sign.
    ///
    /// A store failure here is a hard error: no challenge can be handed out.
    pub async fn request_challenge(&self, wallet_address: &str) -> Result<Challenge, AuthError> {
        if wallet_address.trim().is_empty() {
            return Err(AuthError::InvalidAddress);
        }

        let challenge = self.challenges.issue(wallet_address).await?;
        tracing::debug!(wallet = %wallet_address, nonce = %challenge.nonce, "Issued auth challenge");
        Ok(challenge)
    }

    /// Check a signed challenge and start a session on success.
    ///
    /// Only the most recent outstanding challenge counts; the submitted
    /// message must match its text byte-for-byte before the signature is
    /// even looked at, so a signature over any other text cannot be
    /// replayed against it.
    pub async fn verify(
        &self,
        wallet_address: &str,
        signature: &str,
        message: &str,
    ) -> Result<VerifyDecision, AuthError> {
        let Some(challenge) = self.challenges.most_recent_for(wallet_address).await? else {
            return Ok(VerifyDecision::Rejected(RejectReason::NoChallenge));
        };

        if challenge.challenge_text != message {
            return Ok(VerifyDecision::Rejected(RejectReason::MessageMismatch));
        }

        // The verifier may fail on malformed input; that is the same verdict
        // as a wrong signature, and the challenge stays live for a retry.
        let passed = match self
            .verifier
            .verify(message.as_bytes(), signature, wallet_address)
            .await
        {
            Ok(passed) => passed,
            Err(e) => {
                tracing::debug!(wallet = %wallet_address, "Signature verification errored: {}", e);
                false
            }
        };

        if !passed {
            return Ok(VerifyDecision::Rejected(RejectReason::SignatureInvalid));
        }

        let user = self.users.find_or_create(wallet_address).await?;

        // The verification already succeeded; a failed delete must not flip
        // the result. The record expires on its own either way.
        if let Err(e) = self.challenges.consume(challenge.id).await {
            tracing::warn!(
                challenge_id = %challenge.id,
                wallet = %wallet_address,
                "Failed to consume spent challenge: {}", e
            );
        }

        tracing::info!(wallet = %wallet_address, user_id = %user.id, "Wallet authenticated");
        Ok(VerifyDecision::Accepted(user))
    }
}
