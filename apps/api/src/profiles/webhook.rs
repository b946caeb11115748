//! Identity-provider webhook: verifies Svix-style signatures and provisions a
//! profile for every `user.created` event.
//!
//! Signature scheme: `base64(HMAC-SHA256(key, "{svix-id}.{svix-timestamp}.{body}"))`
//! where `key` is the base64 secret after the `whsec_` prefix. The
//! `svix-signature` header carries one or more space-separated `v1,<sig>`
//! entries; any match is accepted.

use axum::{extract::State, http::HeaderMap, Json};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::{json, Value};
use sha2::Sha256;
use thiserror::Error;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::user::NewUserProfile;
use crate::state::AppState;
use crate::store::StoreError;

type HmacSha256 = Hmac<Sha256>;

/// Maximum clock skew accepted on `svix-timestamp`, in seconds.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 5 * 60;

const SECRET_PREFIX: &str = "whsec_";
const HEADER_ID: &str = "svix-id";
const HEADER_TIMESTAMP: &str = "svix-timestamp";
const HEADER_SIGNATURE: &str = "svix-signature";

#[derive(Debug, Error, PartialEq)]
pub enum SignatureError {
    #[error("missing svix headers")]
    MissingHeaders,

    #[error("webhook secret is not valid base64")]
    InvalidSecret,

    #[error("timestamp outside tolerance")]
    StaleTimestamp,

    #[error("no matching signature")]
    BadSignature,
}

pub struct WebhookVerifier {
    key: Vec<u8>,
}

impl WebhookVerifier {
    pub fn from_secret(secret: &str) -> Result<Self, SignatureError> {
        let encoded = secret.trim();
        let encoded = encoded.strip_prefix(SECRET_PREFIX).unwrap_or(encoded);
        let key = STANDARD
            .decode(encoded)
            .map_err(|_| SignatureError::InvalidSecret)?;
        Ok(Self { key })
    }

    fn mac(&self, msg_id: &str, timestamp: &str, body: &[u8]) -> HmacSha256 {
        // HMAC accepts keys of any length.
        let mut mac = HmacSha256::new_from_slice(&self.key).expect("HMAC can take key of any size");
        mac.update(msg_id.as_bytes());
        mac.update(b".");
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(body);
        mac
    }

    /// Base64 signature for a message, in the form placed after `v1,`.
    #[cfg(test)]
    pub fn sign(&self, msg_id: &str, timestamp: &str, body: &[u8]) -> String {
        STANDARD.encode(self.mac(msg_id, timestamp, body).finalize().into_bytes())
    }

    /// Verifies the svix headers against `body`. `now` is unix seconds.
    pub fn verify(&self, headers: &HeaderMap, body: &[u8], now: i64) -> Result<(), SignatureError> {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };
        let (Some(msg_id), Some(timestamp), Some(signatures)) = (
            header(HEADER_ID),
            header(HEADER_TIMESTAMP),
            header(HEADER_SIGNATURE),
        ) else {
            return Err(SignatureError::MissingHeaders);
        };

        let sent_at: i64 = timestamp
            .parse()
            .map_err(|_| SignatureError::StaleTimestamp)?;
        if (now - sent_at).abs() > SIGNATURE_TOLERANCE_SECS {
            return Err(SignatureError::StaleTimestamp);
        }

        let expected = self.mac(msg_id, timestamp, body);
        let matched = signatures
            .split_whitespace()
            .filter_map(|entry| entry.strip_prefix("v1,"))
            .filter_map(|sig| STANDARD.decode(sig).ok())
            .any(|sig| expected.clone().verify_slice(&sig).is_ok());

        if matched {
            Ok(())
        } else {
            Err(SignatureError::BadSignature)
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Events
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum EventError {
    #[error("malformed event payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Email address is required but not provided")]
    MissingEmail,
}

/// A verified webhook event, validated at the boundary.
#[derive(Debug, PartialEq)]
pub enum IdentityEvent {
    UserCreated(NewUserProfile),
    /// Any other event type; acknowledged without effect.
    Other(String),
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    data: Value,
}

#[derive(Deserialize)]
struct UserCreatedData {
    id: String,
    #[serde(default)]
    email_addresses: Vec<EmailAddress>,
    #[serde(default)]
    username: Option<String>,
}

#[derive(Deserialize)]
struct EmailAddress {
    #[serde(default)]
    email_address: Option<String>,
}

impl IdentityEvent {
    pub fn parse(body: &[u8]) -> Result<Self, EventError> {
        let envelope: Envelope = serde_json::from_slice(body)?;
        if envelope.event_type != "user.created" {
            return Ok(IdentityEvent::Other(envelope.event_type));
        }

        let data: UserCreatedData = serde_json::from_value(envelope.data)?;
        let email = data
            .email_addresses
            .first()
            .and_then(|e| e.email_address.as_deref())
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or(EventError::MissingEmail)?;

        let username = data
            .username
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| email.split('@').next().unwrap_or(email));

        Ok(IdentityEvent::UserCreated(NewUserProfile {
            external_id: data.id,
            email: email.to_string(),
            username: username.to_string(),
        }))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handler
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/webhooks/identity
pub async fn handle_identity_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let secret = state.config.webhook_secret.as_deref().ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!("WEBHOOK_SECRET is not configured"))
    })?;
    let verifier = WebhookVerifier::from_secret(secret)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("WEBHOOK_SECRET: {e}")))?;

    verifier
        .verify(&headers, &body, chrono::Utc::now().timestamp())
        .map_err(|e| {
            warn!("Rejected identity webhook: {e}");
            AppError::Validation(format!("Error verifying webhook: {e}"))
        })?;

    let event = IdentityEvent::parse(&body).map_err(|e| AppError::Validation(e.to_string()))?;

    match event {
        IdentityEvent::UserCreated(profile) => {
            let user = state.users.insert(&profile).await.map_err(|e| match e {
                StoreError::DuplicateKey(_) => AppError::Conflict("User already exists".to_string()),
                other => AppError::Persistence(other),
            })?;
            info!("Provisioned profile for {}", user.external_id);
            Ok(Json(json!({ "message": "OK", "user": user })))
        }
        IdentityEvent::Other(event_type) => {
            Ok(Json(json!({ "message": "Event received", "type": event_type })))
        }
    }
}
