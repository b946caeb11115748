//! Axum route handlers for the Applications API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::applications::recorder::apply;
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ApplyRequest {
    #[serde(rename = "postingId", alias = "posting_id", default)]
    pub posting_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApplyResponse {
    pub message: String,
    #[serde(rename = "postingURL")]
    pub posting_url: String,
}

/// POST /api/v1/jobs/apply
///
/// Records the caller as an applicant and returns the posting's URL so the
/// client can continue the application on the source site.
pub async fn handle_apply(
    State(state): State<AppState>,
    AuthUser(external_id): AuthUser,
    Json(request): Json<ApplyRequest>,
) -> Result<Json<ApplyResponse>, AppError> {
    let raw_id = request
        .posting_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Validation("postingId is required".to_string()))?;

    let posting_id = Uuid::parse_str(raw_id)
        .map_err(|_| AppError::Validation("postingId must be a valid UUID".to_string()))?;

    let posting_url = apply(
        state.users.as_ref(),
        state.postings.as_ref(),
        &external_id,
        posting_id,
    )
    .await?;

    Ok(Json(ApplyResponse {
        message: "Application submitted successfully".to_string(),
        posting_url,
    }))
}
