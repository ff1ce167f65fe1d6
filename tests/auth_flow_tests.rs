//! Wallet authentication flow tests
//!
//! Drives the authenticator against the in-memory stores with stub
//! verifiers, covering the full decision table: most-recent-only lookup,
//! exact message matching, single use, lazy user creation, and the
//! tolerated consume failure.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use launchpad_server::auth::{
    AuthService, RejectReason, SignatureError, SignatureVerifier, VerifyDecision,
};
use launchpad_server::models::Challenge;
use launchpad_server::store::{
    ChallengeStore, MemoryChallengeStore, MemoryUserDirectory, StoreError,
};

const WALLET: &str = "8jq7mDvSzXbXvBMWXfAE9WPZkVMAkWtPnFpGGLkW3p9w";

// ============================================================================
// Test doubles
// ============================================================================

/// Signature verifier stub with a fixed behavior.
#[derive(Clone, Copy)]
enum StubVerifier {
    Accept,
    Reject,
    Explode,
}

#[async_trait]
impl SignatureVerifier for StubVerifier {
    async fn verify(&self, _: &[u8], _: &str, _: &str) -> Result<bool, SignatureError> {
        match self {
            StubVerifier::Accept => Ok(true),
            StubVerifier::Reject => Ok(false),
            StubVerifier::Explode => Err(SignatureError::InvalidSignatureFormat(
                "backend exploded".to_string(),
            )),
        }
    }
}

/// Challenge store whose deletes always fail, for the consume-failure path.
struct FailingConsume(MemoryChallengeStore);

#[async_trait]
impl ChallengeStore for FailingConsume {
    async fn issue(&self, wallet_address: &str) -> Result<Challenge, StoreError> {
        self.0.issue(wallet_address).await
    }

    async fn most_recent_for(
        &self,
        wallet_address: &str,
    ) -> Result<Option<Challenge>, StoreError> {
        self.0.most_recent_for(wallet_address).await
    }

    async fn consume(&self, _id: Uuid) -> Result<(), StoreError> {
        Err(StoreError::Backend("delete refused".to_string()))
    }

    async fn purge_expired(&self) -> Result<u64, StoreError> {
        self.0.purge_expired().await
    }
}

// ============================================================================
// Harness
// ============================================================================

/// Explicit challenge lifecycle states. Storage only ever represents
/// presence/absence; the probe below recovers the full triple for
/// assertions.
#[derive(Debug, PartialEq, Eq)]
enum ChallengeState {
    Issued,
    Consumed,
    Expired,
}

async fn challenge_state(store: &dyn ChallengeStore, challenge: &Challenge) -> ChallengeState {
    match store
        .most_recent_for(&challenge.wallet_address)
        .await
        .unwrap()
    {
        Some(found) if found.id == challenge.id => ChallengeState::Issued,
        _ if challenge.is_expired() => ChallengeState::Expired,
        _ => ChallengeState::Consumed,
    }
}

struct Harness {
    challenges: Arc<MemoryChallengeStore>,
    users: Arc<MemoryUserDirectory>,
    service: AuthService,
}

fn harness(verifier: StubVerifier) -> Harness {
    harness_with_ttl(verifier, 300)
}

fn harness_with_ttl(verifier: StubVerifier, ttl_seconds: i64) -> Harness {
    let challenges = Arc::new(MemoryChallengeStore::new(ttl_seconds));
    let users = Arc::new(MemoryUserDirectory::new());
    let service = AuthService::new(challenges.clone(), users.clone(), Arc::new(verifier));
    Harness {
        challenges,
        users,
        service,
    }
}

fn rejected_with(decision: &VerifyDecision, reason: RejectReason) -> bool {
    matches!(decision, VerifyDecision::Rejected(r) if *r == reason)
}

// ============================================================================
// Challenge issuance
// ============================================================================

#[tokio::test]
async fn issued_challenge_embeds_its_nonce() {
    let h = harness(StubVerifier::Accept);

    let challenge = h.service.request_challenge(WALLET).await.unwrap();
    assert!(challenge.challenge_text.contains(&challenge.nonce));
    assert_eq!(challenge.wallet_address, WALLET);
}

#[tokio::test]
async fn successive_challenges_differ() {
    let h = harness(StubVerifier::Accept);

    let a = h.service.request_challenge(WALLET).await.unwrap();
    let b = h.service.request_challenge(WALLET).await.unwrap();
    assert_ne!(a.nonce, b.nonce);
    assert_ne!(a.challenge_text, b.challenge_text);

    // Both stay stored; only the newer one is reachable.
    assert_eq!(h.challenges.len(), 2);
    assert_eq!(
        challenge_state(h.challenges.as_ref(), &b).await,
        ChallengeState::Issued
    );
}

// ============================================================================
// Verification decision table
// ============================================================================

#[tokio::test]
async fn valid_signature_authenticates_exactly_once() {
    let h = harness(StubVerifier::Accept);
    let challenge = h.service.request_challenge(WALLET).await.unwrap();

    let first = h
        .service
        .verify(WALLET, "sig", &challenge.challenge_text)
        .await
        .unwrap();
    let user = match first {
        VerifyDecision::Accepted(user) => user,
        VerifyDecision::Rejected(reason) => panic!("expected acceptance, got {:?}", reason),
    };
    assert_eq!(user.wallet_address, WALLET);
    assert_eq!(
        challenge_state(h.challenges.as_ref(), &challenge).await,
        ChallengeState::Consumed
    );

    // Same signature and message immediately after: the challenge is gone.
    let second = h
        .service
        .verify(WALLET, "sig", &challenge.challenge_text)
        .await
        .unwrap();
    assert!(rejected_with(&second, RejectReason::NoChallenge));
}

#[tokio::test]
async fn message_must_match_stored_text_exactly() {
    let h = harness(StubVerifier::Accept);
    let challenge = h.service.request_challenge(WALLET).await.unwrap();

    let decision = h
        .service
        .verify(WALLET, "sig", "some other text")
        .await
        .unwrap();
    assert!(rejected_with(&decision, RejectReason::MessageMismatch));

    // A mismatch does not consume the challenge.
    assert_eq!(
        challenge_state(h.challenges.as_ref(), &challenge).await,
        ChallengeState::Issued
    );
}

#[tokio::test]
async fn only_the_most_recent_challenge_counts() {
    let h = harness(StubVerifier::Accept);
    let old = h.service.request_challenge(WALLET).await.unwrap();
    let new = h.service.request_challenge(WALLET).await.unwrap();

    // The older challenge is unexpired and still stored, but superseded.
    let decision = h
        .service
        .verify(WALLET, "sig", &old.challenge_text)
        .await
        .unwrap();
    assert!(rejected_with(&decision, RejectReason::MessageMismatch));

    let decision = h
        .service
        .verify(WALLET, "sig", &new.challenge_text)
        .await
        .unwrap();
    assert!(matches!(decision, VerifyDecision::Accepted(_)));
}

#[tokio::test]
async fn unknown_wallet_is_rejected() {
    let h = harness(StubVerifier::Accept);

    let decision = h
        .service
        .verify("never-seen-wallet", "sig", "any message")
        .await
        .unwrap();
    assert!(rejected_with(&decision, RejectReason::NoChallenge));
    assert!(h.users.is_empty());
}

#[tokio::test]
async fn failed_signature_leaves_the_challenge_open_for_retry() {
    let h = harness(StubVerifier::Reject);
    let challenge = h.service.request_challenge(WALLET).await.unwrap();

    let decision = h
        .service
        .verify(WALLET, "bad-sig", &challenge.challenge_text)
        .await
        .unwrap();
    assert!(rejected_with(&decision, RejectReason::SignatureInvalid));
    assert!(h.users.is_empty());
    assert_eq!(
        challenge_state(h.challenges.as_ref(), &challenge).await,
        ChallengeState::Issued
    );

    // A corrected signature against the same challenge still works.
    let retry_service = AuthService::new(
        h.challenges.clone(),
        h.users.clone(),
        Arc::new(StubVerifier::Accept),
    );
    let decision = retry_service
        .verify(WALLET, "good-sig", &challenge.challenge_text)
        .await
        .unwrap();
    assert!(matches!(decision, VerifyDecision::Accepted(_)));
}

#[tokio::test]
async fn verifier_errors_are_a_rejection_not_a_crash() {
    let h = harness(StubVerifier::Explode);
    let challenge = h.service.request_challenge(WALLET).await.unwrap();

    let decision = h
        .service
        .verify(WALLET, "garbage", &challenge.challenge_text)
        .await
        .unwrap();
    assert!(rejected_with(&decision, RejectReason::SignatureInvalid));
}

#[tokio::test]
async fn expired_challenge_is_rejected_regardless_of_signature() {
    let h = harness_with_ttl(StubVerifier::Accept, -1);
    let challenge = h.service.request_challenge(WALLET).await.unwrap();

    let decision = h
        .service
        .verify(WALLET, "sig", &challenge.challenge_text)
        .await
        .unwrap();
    assert!(rejected_with(&decision, RejectReason::NoChallenge));
    assert_eq!(
        challenge_state(h.challenges.as_ref(), &challenge).await,
        ChallengeState::Expired
    );
}

// ============================================================================
// User creation
// ============================================================================

#[tokio::test]
async fn first_login_creates_the_user_later_logins_reuse_it() {
    let h = harness(StubVerifier::Accept);

    let challenge = h.service.request_challenge(WALLET).await.unwrap();
    let first = h
        .service
        .verify(WALLET, "sig", &challenge.challenge_text)
        .await
        .unwrap();
    let VerifyDecision::Accepted(created) = first else {
        panic!("expected acceptance");
    };
    assert_eq!(h.users.len(), 1);

    let challenge = h.service.request_challenge(WALLET).await.unwrap();
    let second = h
        .service
        .verify(WALLET, "sig", &challenge.challenge_text)
        .await
        .unwrap();
    let VerifyDecision::Accepted(reused) = second else {
        panic!("expected acceptance");
    };

    assert_eq!(created.id, reused.id);
    assert_eq!(h.users.len(), 1);
}

// ============================================================================
// Consume failure tolerance
// ============================================================================

#[tokio::test]
async fn consume_failure_does_not_flip_a_successful_verification() {
    let challenges = Arc::new(FailingConsume(MemoryChallengeStore::new(300)));
    let users = Arc::new(MemoryUserDirectory::new());
    let service = AuthService::new(
        challenges.clone(),
        users.clone(),
        Arc::new(StubVerifier::Accept),
    );

    let challenge = service.request_challenge(WALLET).await.unwrap();
    let decision = service
        .verify(WALLET, "sig", &challenge.challenge_text)
        .await
        .unwrap();

    assert!(matches!(decision, VerifyDecision::Accepted(_)));
    assert_eq!(users.len(), 1);
}
