mod applications;
mod auth;
mod config;
mod db;
mod errors;
mod feeds;
mod ingestion;
mod models;
mod profiles;
mod routes;
mod state;
mod store;

use anyhow::{Context, Result};
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::auth::SessionVerifier;
use crate::config::Config;
use crate::db::{create_pool, run_migrations};
use crate::feeds::HttpFeedClient;
use crate::profiles::S3ResumeStorage;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::PgStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Matchboard API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    run_migrations(&db).await?;
    let store = Arc::new(PgStore::new(db));

    // Initialize S3 / MinIO
    let s3 = build_s3_client(&config).await;
    info!("S3 client initialized (bucket: {})", config.s3_bucket);

    // Initialize feed client
    let fetcher = HttpFeedClient::new(config.feed_timeout).context("building feed HTTP client")?;
    info!(
        "Feed client initialized: {} sources, {}s timeout",
        config.feed_urls.len(),
        config.feed_timeout.as_secs()
    );

    let sessions = SessionVerifier::from_rsa_pem(&config.clerk_jwt_public_key)
        .context("CLERK_JWT_PUBLIC_KEY must be an RSA public key in PEM format")?;

    if config.webhook_secret.is_none() {
        tracing::warn!("WEBHOOK_SECRET is not set; identity webhooks will be rejected");
    }

    // Build app state
    let state = AppState {
        postings: store.clone(),
        users: store,
        fetcher: Arc::new(fetcher),
        resumes: Arc::new(S3ResumeStorage::new(s3, config.s3_bucket.clone())),
        sessions: Arc::new(sessions),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict CORS origins to the web client's domain

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "matchboard-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
