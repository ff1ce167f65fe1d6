//! Authentication HTTP handlers
//!
//! Endpoints for wallet-based authentication.

use axum::{extract::State, Json};
use validator::Validate;

use crate::error::ApiError;
use crate::middleware::AuthenticatedUser;
use crate::models::{
    AuthTokenResponse, ChallengeRequest, ChallengeResponse, UserResponse, VerifyRequest,
};
use crate::state::AppState;
use crate::auth::VerifyDecision;

/// POST /auth/challenge - Request a challenge for wallet authentication
pub async fn request_challenge(
    State(state): State<AppState>,
    Json(req): Json<ChallengeRequest>,
) -> Result<Json<ChallengeResponse>, ApiError> {
    req.validate()?;

    let challenge = state
        .auth_service
        .request_challenge(&req.wallet_address)
        .await?;

    Ok(Json(challenge.into()))
}

/// POST /auth/verify - Verify a signed challenge and issue a bearer token
///
/// Every rejection surfaces as the same 401 regardless of cause, so the
/// endpoint leaks nothing about whether an address has a challenge open.
pub async fn verify_signature(
    State(state): State<AppState>,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<AuthTokenResponse>, ApiError> {
    let decision = state
        .auth_service
        .verify(&req.wallet_address, &req.signature, &req.message)
        .await?;

    match decision {
        VerifyDecision::Accepted(user) => {
            let access_token = state
                .token_issuer
                .mint(&user.wallet_address)
                .map_err(|e| ApiError::InternalError(e.to_string()))?;

            Ok(Json(AuthTokenResponse {
                access_token,
                token_type: "Bearer".to_string(),
                expires_in: state.token_issuer.ttl_seconds(),
                user: user.into(),
            }))
        }
        VerifyDecision::Rejected(reason) => {
            tracing::debug!(?reason, wallet = %req.wallet_address, "Authentication rejected");
            Err(ApiError::Unauthorized("invalid signature".to_string()))
        }
    }
}

/// GET /auth/whoami - Current user for the presented bearer token
pub async fn whoami(AuthenticatedUser(user): AuthenticatedUser) -> Json<UserResponse> {
    Json(user.into())
}
