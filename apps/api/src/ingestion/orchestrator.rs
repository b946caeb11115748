//! Ingestion Orchestrator: pulls every configured feed, deduplicates by
//! source URL, and persists new or rescored postings.
//!
//! Flow per source: fetch (bounded) → skip incomplete items → rescore known
//! URLs → extract + score + insert unknown URLs. A failing source is recorded
//! and skipped; only persistence failures abort the run.
//!
//! Fetches run concurrently but are consumed in configured order, and each
//! source is persisted as soon as it and every source before it have
//! arrived. A run cancelled midway keeps what it already wrote.

use std::time::Duration;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::feeds::{Feed, FeedErrorKind, FeedFetchError, FeedFetcher, FeedItem};
use crate::ingestion::extractor::extract_fields;
use crate::ingestion::samples::sample_postings;
use crate::ingestion::scoring::score;
use crate::models::posting::{NewPosting, PostingRow};
use crate::store::{PostingStore, StoreError};

/// Source name recorded when a feed has no title of its own.
const FALLBACK_SOURCE_NAME: &str = "RSS Feed";
const DEFAULT_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub fetch_timeout: Duration,
    /// Cap on the ranked posting list returned to the caller.
    pub page_size: usize,
    /// Seed sample postings when every source fails and storage is empty.
    pub seed_samples: bool,
}

impl IngestOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            fetch_timeout: config.feed_timeout,
            page_size: DEFAULT_PAGE_SIZE,
            seed_samples: config.seed_sample_postings,
        }
    }
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(10),
            page_size: DEFAULT_PAGE_SIZE,
            seed_samples: false,
        }
    }
}

#[derive(Debug)]
pub struct IngestReport {
    /// Postings inserted during this run.
    pub new_postings: Vec<PostingRow>,
    /// All postings, ranked by score then publication date, capped at the page size.
    pub postings: Vec<PostingRow>,
    pub errors: Vec<FeedFetchError>,
}

enum ItemOutcome {
    Inserted(PostingRow),
    Rescored,
    Unchanged,
    Skipped,
    Duplicate,
}

pub struct Ingestor<'a> {
    fetcher: &'a dyn FeedFetcher,
    postings: &'a dyn PostingStore,
    options: IngestOptions,
}

impl<'a> Ingestor<'a> {
    pub fn new(
        fetcher: &'a dyn FeedFetcher,
        postings: &'a dyn PostingStore,
        options: IngestOptions,
    ) -> Self {
        Self {
            fetcher,
            postings,
            options,
        }
    }

    /// Runs one ingestion pass over `sources`. `skill` drives scoring; when
    /// absent, new postings score 0 and existing scores are left alone.
    pub async fn ingest(
        &self,
        sources: &[String],
        skill: Option<&str>,
    ) -> Result<IngestReport, StoreError> {
        let skill = skill.map(str::trim).filter(|s| !s.is_empty());

        let mut fetches = stream::iter(sources)
            .map(move |endpoint| async move { (endpoint, self.fetch_bounded(endpoint).await) })
            .buffered(sources.len().max(1))
            .boxed();

        let mut new_postings = Vec::new();
        let mut errors = Vec::new();

        while let Some((endpoint, result)) = fetches.next().await {
            match result {
                Ok(feed) => {
                    info!(
                        "Feed {:?} from {} has {} items",
                        feed.title.as_deref().unwrap_or(FALLBACK_SOURCE_NAME),
                        endpoint,
                        feed.items.len()
                    );
                    let inserted = self.ingest_feed(&feed, skill, &mut new_postings).await?;
                    info!("Processed {inserted} new postings from {endpoint}");
                }
                Err(e) => {
                    warn!("{e}");
                    errors.push(e);
                }
            }
        }

        let all_sources_failed = !sources.is_empty() && errors.len() == sources.len();
        if all_sources_failed && self.options.seed_samples && self.postings.count().await? == 0 {
            self.seed_samples(skill).await?;
        }

        let postings = self.postings.list_ranked(self.options.page_size).await?;

        Ok(IngestReport {
            new_postings,
            postings,
            errors,
        })
    }

    /// Fetches one endpoint under the configured timeout, whatever the fetcher.
    async fn fetch_bounded(&self, endpoint: &str) -> Result<Feed, FeedFetchError> {
        info!("Fetching feed: {endpoint}");
        let timeout = self.options.fetch_timeout;
        match tokio::time::timeout(timeout, self.fetcher.fetch(endpoint)).await {
            Ok(result) => result,
            Err(_) => Err(FeedFetchError::new(
                endpoint,
                FeedErrorKind::Timeout(timeout.as_secs()),
            )),
        }
    }

    async fn ingest_feed(
        &self,
        feed: &Feed,
        skill: Option<&str>,
        new_postings: &mut Vec<PostingRow>,
    ) -> Result<usize, StoreError> {
        let mut inserted = 0;
        for item in &feed.items {
            match self.ingest_item(item, feed.title.as_deref(), skill).await? {
                ItemOutcome::Inserted(row) => {
                    new_postings.push(row);
                    inserted += 1;
                }
                ItemOutcome::Rescored | ItemOutcome::Unchanged => {}
                ItemOutcome::Skipped => debug!("Skipping item: missing link or title"),
                ItemOutcome::Duplicate => {
                    debug!("Posting inserted concurrently, skipping: {:?}", item.link)
                }
            }
        }
        Ok(inserted)
    }

    async fn ingest_item(
        &self,
        item: &FeedItem,
        feed_title: Option<&str>,
        skill: Option<&str>,
    ) -> Result<ItemOutcome, StoreError> {
        let (Some(link), Some(title)) = (non_blank(&item.link), non_blank(&item.title)) else {
            return Ok(ItemOutcome::Skipped);
        };

        if let Some(existing) = self.postings.find_by_url(link).await? {
            return match skill {
                Some(skill) => {
                    let relevance_score = score(item.best_text(), skill);
                    self.postings
                        .update_score(existing.id, relevance_score)
                        .await?;
                    Ok(ItemOutcome::Rescored)
                }
                None => Ok(ItemOutcome::Unchanged),
            };
        }

        let fields = extract_fields(item, feed_title);
        let relevance_score = skill.map_or(0.0, |skill| score(item.best_text(), skill));

        let new_posting = NewPosting {
            title: title.to_string(),
            company: fields.company,
            description: fields.description,
            location: Some(fields.location),
            source_url: link.to_string(),
            source_name: feed_title
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .unwrap_or(FALLBACK_SOURCE_NAME)
                .to_string(),
            published_at: item.published.unwrap_or_else(chrono::Utc::now),
            relevance_score,
        };

        match self.postings.insert(&new_posting).await {
            Ok(row) => Ok(ItemOutcome::Inserted(row)),
            Err(StoreError::DuplicateKey(_)) => Ok(ItemOutcome::Duplicate),
            Err(e) => Err(e),
        }
    }

    async fn seed_samples(&self, skill: Option<&str>) -> Result<(), StoreError> {
        info!("No postings available from any feed; seeding sample postings");
        for sample in sample_postings(skill) {
            match self.postings.insert(&sample).await {
                Ok(_) | Err(StoreError::DuplicateKey(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

fn non_blank(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
