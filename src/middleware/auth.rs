//! Authentication middleware
//!
//! Extractor that turns a `Authorization: Bearer <token>` header into the
//! authenticated user, or rejects with 401.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::auth::{JwtError, TokenIssuer};
use crate::error::ApiError;
use crate::models::User;
use crate::store::UserDirectory;

/// Authenticated user resolved from a bearer token.
///
/// Validation is stateless (RS256 signature + expiry); the user lookup then
/// catches tokens minted for an address whose user record no longer exists.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<TokenIssuer>: FromRef<S>,
    Arc<dyn UserDirectory>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    ApiError::Unauthorized(
                        "Authorization header with Bearer token required".to_string(),
                    )
                    .into_response()
                })?;

        let issuer: Arc<TokenIssuer> = FromRef::from_ref(state);

        let claims = issuer.validate(bearer.token()).map_err(|e| {
            let message = match e {
                JwtError::TokenExpired => "Token has expired",
                _ => "Invalid token",
            };
            ApiError::Unauthorized(message.to_string()).into_response()
        })?;

        let users: Arc<dyn UserDirectory> = FromRef::from_ref(state);

        let user = users
            .find_by_address(&claims.sub)
            .await
            .map_err(|e| ApiError::from(e).into_response())?
            .ok_or_else(|| {
                ApiError::Unauthorized("Unknown user".to_string()).into_response()
            })?;

        Ok(AuthenticatedUser(user))
    }
}
