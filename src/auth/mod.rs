//! Wallet-based authentication
//!
//! Challenge issuance, signature verification, and bearer token handling.

pub mod crypto;
pub mod jwt;
pub mod service;

pub use crypto::{Ed25519Verifier, SignatureError, SignatureVerifier};
pub use jwt::{Claims, JwtError, TokenIssuer};
pub use service::{AuthError, AuthService, RejectReason, VerifyDecision};
