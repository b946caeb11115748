//! Session verification for requests from the identity provider's clients.
//!
//! Tokens arrive as `Authorization: Bearer <jwt>` and are verified locally
//! against the provider's PEM public key. The `sub` claim is the user's
//! external id, the only identity the rest of the service sees.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// External user id.
    pub sub: String,
    pub exp: i64,
}

pub struct SessionVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl SessionVerifier {
    /// Builds an RS256 verifier from a PEM public key. Escaped `\n`
    /// sequences, as commonly found in single-line env values, are accepted.
    pub fn from_rsa_pem(pem: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        let pem = pem.replace("\\n", "\n");
        Ok(Self {
            decoding_key: DecodingKey::from_rsa_pem(pem.as_bytes())?,
            validation: session_validation(Algorithm::RS256),
        })
    }

    /// HS256 verifier so tests can mint tokens without a key pair.
    #[cfg(test)]
    pub fn with_secret(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: session_validation(Algorithm::HS256),
        }
    }

    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(token, &self.decoding_key, &self.validation).map(|data| data.claims)
    }
}

fn session_validation(algorithm: Algorithm) -> Validation {
    let mut validation = Validation::new(algorithm);
    // Session tokens carry no audience unless one is configured provider-side.
    validation.validate_aud = false;
    validation
}

/// Extracts the token from `Authorization: Bearer <token>`.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// The verified caller's external user id. Rejects with 401.
#[derive(Debug, Clone)]
pub struct AuthUser(pub String);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(AppError::Unauthorized)?;

        let claims = state.sessions.verify(token).map_err(|e| {
            debug!("Rejected session token: {e}");
            AppError::Unauthorized
        })?;

        if claims.sub.trim().is_empty() {
            return Err(AppError::Unauthorized);
        }

        Ok(AuthUser(claims.sub))
    }
}
