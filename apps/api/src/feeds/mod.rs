//! Feed Client: fetches syndication feeds (RSS 2.0 / Atom) and normalizes
//! their entries into [`FeedItem`]s.
//!
//! All network access for ingestion goes through a [`FeedFetcher`];
//! `HttpFeedClient` is the production implementation.

pub mod client;
pub mod parser;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

pub use client::HttpFeedClient;

/// A parsed feed: its display name plus entries in document order.
#[derive(Debug, Clone, Default)]
pub struct Feed {
    pub title: Option<String>,
    pub items: Vec<FeedItem>,
}

/// One raw feed entry, before field extraction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedItem {
    pub link: Option<String>,
    pub title: Option<String>,
    /// Full body: `content:encoded` or `description` (RSS), `content` or `summary` (Atom).
    pub content: Option<String>,
    /// `content` with markup stripped and whitespace collapsed.
    pub content_snippet: Option<String>,
    pub published: Option<DateTime<Utc>>,
}

impl FeedItem {
    /// Text used for extraction and scoring: snippet, then content, then title.
    pub fn best_text(&self) -> &str {
        [&self.content_snippet, &self.content, &self.title]
            .into_iter()
            .filter_map(|f| f.as_deref())
            .find(|s| !s.trim().is_empty())
            .unwrap_or("")
    }
}

#[derive(Debug, Error)]
pub enum FeedErrorKind {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("timed out after {0}s")]
    Timeout(u64),
}

/// Failure to fetch or parse a single endpoint. Recoverable: the
/// orchestrator records it and moves on to the next source.
#[derive(Debug, Error)]
#[error("Error fetching feed {endpoint}: {cause}")]
pub struct FeedFetchError {
    pub endpoint: String,
    #[source]
    pub cause: FeedErrorKind,
}

impl FeedFetchError {
    pub fn new(endpoint: impl Into<String>, cause: FeedErrorKind) -> Self {
        Self {
            endpoint: endpoint.into(),
            cause,
        }
    }
}

#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, endpoint: &str) -> Result<Feed, FeedFetchError>;
}
