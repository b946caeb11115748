pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::applications::handlers as applications;
use crate::ingestion::handlers as jobs;
use crate::profiles::{onboarding, onboarding::MAX_RESUME_BYTES, webhook};
use crate::state::AppState;

/// Room for the résumé plus the text fields and multipart framing.
const ONBOARDING_BODY_LIMIT: usize = MAX_RESUME_BYTES + 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Jobs API
        .route("/api/v1/jobs/fetch", get(jobs::handle_fetch_postings))
        .route("/api/v1/jobs/apply", post(applications::handle_apply))
        // Profiles API
        .route(
            "/api/v1/onboarding",
            post(onboarding::handle_onboarding).layer(DefaultBodyLimit::max(ONBOARDING_BODY_LIMIT)),
        )
        .route(
            "/api/v1/webhooks/identity",
            post(webhook::handle_identity_webhook),
        )
        .with_state(state)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
