use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::feeds::parser::parse_feed;
use crate::feeds::{Feed, FeedErrorKind, FeedFetchError, FeedFetcher};

const USER_AGENT: &str = concat!("matchboard/", env!("CARGO_PKG_VERSION"));
const ACCEPT: &str = "application/rss+xml, application/atom+xml, application/xml;q=0.9, text/xml;q=0.8, */*;q=0.5";

/// HTTP feed client. Every request is bounded by `timeout`.
#[derive(Clone)]
pub struct HttpFeedClient {
    client: Client,
    timeout: Duration,
}

impl HttpFeedClient {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Client::builder()
                .timeout(timeout)
                .user_agent(USER_AGENT)
                .build()?,
            timeout,
        })
    }
}

#[async_trait]
impl FeedFetcher for HttpFeedClient {
    async fn fetch(&self, endpoint: &str) -> Result<Feed, FeedFetchError> {
        let fail = |cause| FeedFetchError::new(endpoint, cause);

        let response = self
            .client
            .get(endpoint)
            .header("accept", ACCEPT)
            .send()
            .await
            .map_err(|e| fail(self.classify(e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fail(FeedErrorKind::Status(status.as_u16())));
        }

        let body = response.text().await.map_err(|e| fail(self.classify(e)))?;
        let feed = parse_feed(&body).map_err(fail)?;

        debug!(
            "Feed {} parsed: title={:?}, items={}",
            endpoint,
            feed.title,
            feed.items.len()
        );
        Ok(feed)
    }
}

impl HttpFeedClient {
    fn classify(&self, e: reqwest::Error) -> FeedErrorKind {
        if e.is_timeout() {
            FeedErrorKind::Timeout(self.timeout.as_secs())
        } else {
            FeedErrorKind::Http(e)
        }
    }
}
