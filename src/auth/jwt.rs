//! Bearer token minting and validation
//!
//! RS256 tokens bound to a wallet address. The private key stays with the
//! issuing service; anything holding the public half can validate, so
//! verification never requires signing capability.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// JWT-related errors
#[derive(Error, Debug)]
pub enum JwtError {
    #[error("invalid key material: {0}")]
    InvalidKey(String),

    #[error("token encoding failed: {0}")]
    EncodingFailed(String),

    #[error("token expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    InvalidToken(String),
}

/// Claims carried by an access token
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Wallet address the token was minted for
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

/// Mints and validates RS256 bearer tokens.
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_seconds: i64,
}

impl TokenIssuer {
    /// Build an issuer from PEM-encoded RSA key material.
    pub fn from_rsa_pem(
        private_pem: &[u8],
        public_pem: &[u8],
        ttl_seconds: i64,
    ) -> Result<Self, JwtError> {
        let encoding_key = EncodingKey::from_rsa_pem(private_pem)
            .map_err(|e| JwtError::InvalidKey(format!("private key: {}", e)))?;
        let decoding_key = DecodingKey::from_rsa_pem(public_pem)
            .map_err(|e| JwtError::InvalidKey(format!("public key: {}", e)))?;

        Ok(Self {
            encoding_key,
            decoding_key,
            ttl_seconds,
        })
    }

    /// Mint an access token for a wallet address.
    ///
    /// Pure function of the address and the signing key; no store
    /// interaction.
    pub fn mint(&self, wallet_address: &str) -> Result<String, JwtError> {
        let now = Utc::now();
        let claims = Claims {
            sub: wallet_address.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.ttl_seconds)).timestamp(),
        };

        encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    /// Verify signature and expiry, returning the claims.
    pub fn validate(&self, token: &str) -> Result<Claims, JwtError> {
        let validation = Validation::new(Algorithm::RS256);

        let token_data =
            decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::ExpiredSignature => JwtError::TokenExpired,
                    _ => JwtError::InvalidToken(e.to_string()),
                }
            })?;

        Ok(token_data.claims)
    }

    /// Access-token lifetime, for the `expires_in` response field.
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }
}
