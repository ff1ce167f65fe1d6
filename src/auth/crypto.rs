//! Wallet signature verification
//!
//! Verifies ed25519 signatures from launchpad wallets. Wallet addresses are
//! base58-encoded 32-byte ed25519 public keys, signatures arrive
//! base64-encoded.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use thiserror::Error;

/// Errors that can occur during signature verification
#[derive(Error, Debug)]
pub enum SignatureError {
    #[error("invalid wallet address: {0}")]
    InvalidAddress(String),

    #[error("invalid signature format: {0}")]
    InvalidSignatureFormat(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),
}

/// Proof-of-key-possession check, injected into the authenticator.
///
/// `Ok(false)` is a signature that does not match; `Err` is input the
/// backend could not even parse. The authenticator treats both as a failed
/// verification, so implementations are free to error on malformed input.
#[async_trait]
pub trait SignatureVerifier: Send + Sync {
    async fn verify(
        &self,
        message: &[u8],
        signature: &str,
        wallet_address: &str,
    ) -> Result<bool, SignatureError>;
}

/// ed25519 verifier for base58 wallet addresses.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Verifier;

#[async_trait]
impl SignatureVerifier for Ed25519Verifier {
    async fn verify(
        &self,
        message: &[u8],
        signature: &str,
        wallet_address: &str,
    ) -> Result<bool, SignatureError> {
        let public_key_bytes = decode_wallet_address(wallet_address)?;

        let signature_bytes = BASE64
            .decode(signature)
            .map_err(|e| SignatureError::InvalidSignatureFormat(e.to_string()))?;

        let signature = Signature::from_slice(&signature_bytes)
            .map_err(|e| SignatureError::InvalidSignatureFormat(e.to_string()))?;

        let verifying_key = VerifyingKey::from_bytes(&public_key_bytes)
            .map_err(|e| SignatureError::InvalidPublicKey(e.to_string()))?;

        Ok(verifying_key.verify(message, &signature).is_ok())
    }
}

/// Decode a base58 wallet address into the raw 32-byte ed25519 public key.
fn decode_wallet_address(address: &str) -> Result<[u8; 32], SignatureError> {
    let decoded = bs58::decode(address)
        .into_vec()
        .map_err(|e| SignatureError::InvalidAddress(e.to_string()))?;

    decoded.try_into().map_err(|bytes: Vec<u8>| {
        SignatureError::InvalidAddress(format!("expected 32 bytes, got {}", bytes.len()))
    })
}
