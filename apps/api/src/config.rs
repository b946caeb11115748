use std::time::Duration;

use anyhow::{Context, Result};

/// Remote-job feeds polled when `FEED_URLS` is not set.
const DEFAULT_FEED_URLS: &[&str] = &[
    "https://weworkremotely.com/remote-jobs.rss",
    "https://remoteok.io/remote-jobs.rss",
    "https://jobs.github.com/positions.atom?description=developer",
];

const DEFAULT_FEED_TIMEOUT_SECS: u64 = 10;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    /// PEM public key used to verify identity-provider session tokens.
    pub clerk_jwt_public_key: String,
    /// Signing secret for the identity webhook (`whsec_...`).
    pub webhook_secret: Option<String>,
    pub feed_urls: Vec<String>,
    pub feed_timeout: Duration,
    pub seed_sample_postings: bool,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let feed_timeout_secs = match std::env::var("FEED_TIMEOUT_SECS") {
            Ok(raw) => raw
                .parse::<u64>()
                .context("FEED_TIMEOUT_SECS must be a whole number of seconds")?,
            Err(_) => DEFAULT_FEED_TIMEOUT_SECS,
        };

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            clerk_jwt_public_key: require_env("CLERK_JWT_PUBLIC_KEY")?,
            webhook_secret: std::env::var("WEBHOOK_SECRET")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            feed_urls: parse_feed_urls(std::env::var("FEED_URLS").ok().as_deref()),
            feed_timeout: Duration::from_secs(feed_timeout_secs),
            seed_sample_postings: parse_flag(std::env::var("SEED_SAMPLE_POSTINGS").ok().as_deref()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Comma-separated list of feed endpoints. Blank entries are dropped; an
/// unset or empty value falls back to the default remote-job feeds.
fn parse_feed_urls(raw: Option<&str>) -> Vec<String> {
    let urls: Vec<String> = raw
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();

    if urls.is_empty() {
        DEFAULT_FEED_URLS.iter().map(|s| s.to_string()).collect()
    } else {
        urls
    }
}

fn parse_flag(raw: Option<&str>) -> bool {
    matches!(
        raw.map(|s| s.trim().to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "yes" | "on")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_urls_default_when_unset() {
        let urls = parse_feed_urls(None);
        assert_eq!(urls.len(), DEFAULT_FEED_URLS.len());
        assert!(urls[0].starts_with("https://weworkremotely.com"));
    }

    #[test]
    fn test_feed_urls_split_and_trimmed() {
        let urls = parse_feed_urls(Some(" https://a.example/rss , ,https://b.example/atom"));
        assert_eq!(urls, vec!["https://a.example/rss", "https://b.example/atom"]);
    }

    #[test]
    fn test_feed_urls_blank_falls_back() {
        assert_eq!(parse_feed_urls(Some("  ,  ")).len(), DEFAULT_FEED_URLS.len());
    }

    #[test]
    fn test_flag_parsing() {
        assert!(parse_flag(Some("true")));
        assert!(parse_flag(Some(" YES ")));
        assert!(parse_flag(Some("1")));
        assert!(!parse_flag(Some("false")));
        assert!(!parse_flag(Some("")));
        assert!(!parse_flag(None));
    }
}
