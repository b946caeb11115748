//! Axum route handlers for the Jobs API.

use axum::{extract::State, Json};
use serde::Serialize;
use tracing::info;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::ingestion::orchestrator::{IngestOptions, Ingestor};
use crate::models::posting::PostingRow;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchPostingsResponse {
    pub postings: Vec<PostingRow>,
    /// Postings newly inserted by this run.
    pub fetched_count: usize,
    pub total_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

/// GET /api/v1/jobs/fetch
///
/// Runs one ingestion pass over the configured feeds, scored against the
/// caller's skill, and returns the ranked posting list. A caller without a
/// profile is served unscored results.
///
/// The pass runs on its own task: if the client disconnects, sources that
/// were already fetched still finish persisting.
pub async fn handle_fetch_postings(
    State(state): State<AppState>,
    AuthUser(external_id): AuthUser,
) -> Result<Json<FetchPostingsResponse>, AppError> {
    let user = state.users.find_by_external_id(&external_id).await?;
    let skill = user.as_ref().and_then(|u| u.skill()).map(String::from);

    let fetcher = state.fetcher.clone();
    let postings = state.postings.clone();
    let sources = state.config.feed_urls.clone();
    let options = IngestOptions::from_config(&state.config);

    let run = tokio::spawn(async move {
        Ingestor::new(fetcher.as_ref(), postings.as_ref(), options)
            .ingest(&sources, skill.as_deref())
            .await
    });
    let report = run
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("ingestion task failed: {e}")))??;

    info!(
        "Ingestion for {external_id}: {} new, {} returned, {} source errors",
        report.new_postings.len(),
        report.postings.len(),
        report.errors.len()
    );

    Ok(Json(FetchPostingsResponse {
        fetched_count: report.new_postings.len(),
        total_count: report.postings.len(),
        errors: report.errors.iter().map(ToString::to_string).collect(),
        postings: report.postings,
    }))
}
