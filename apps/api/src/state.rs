use std::sync::Arc;

use crate::auth::SessionVerifier;
use crate::config::Config;
use crate::feeds::FeedFetcher;
use crate::profiles::ResumeStorage;
use crate::store::{PostingStore, UserStore};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub postings: Arc<dyn PostingStore>,
    pub users: Arc<dyn UserStore>,
    /// Feed source used by ingestion. Default: `HttpFeedClient`.
    pub fetcher: Arc<dyn FeedFetcher>,
    pub resumes: Arc<dyn ResumeStorage>,
    pub sessions: Arc<SessionVerifier>,
    pub config: Config,
}
