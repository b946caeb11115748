//! Persistence collaborators for postings and user profiles.
//!
//! The [`PostingStore`] and [`UserStore`] traits cover exactly what the
//! ingestion pipeline and application recorder need: find by unique key,
//! insert failing on duplicate key, update by key, and ranked listing.
//! `PgStore` backs both in production; tests use the in-memory store.

#[cfg(test)]
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::posting::{NewPosting, PostingRow};
use crate::models::user::{NewUserProfile, OnboardingUpdate, UserProfileRow};

pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write.
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    #[error("persistence unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),
}

/// Result of a conditional append to `applied_by`.
#[derive(Debug, Clone, PartialEq)]
pub enum AppendOutcome {
    /// The applicant was added; carries the posting's source URL.
    Appended { source_url: String },
    AlreadyPresent,
    PostingMissing,
}

#[async_trait]
pub trait PostingStore: Send + Sync {
    async fn find_by_url(&self, source_url: &str) -> Result<Option<PostingRow>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostingRow>, StoreError>;

    /// Inserts a posting. Fails with [`StoreError::DuplicateKey`] when the
    /// source URL is already present.
    async fn insert(&self, posting: &NewPosting) -> Result<PostingRow, StoreError>;

    async fn update_score(&self, id: Uuid, relevance_score: f64) -> Result<(), StoreError>;

    /// Postings ordered by relevance score, then publication date, both descending.
    async fn list_ranked(&self, limit: usize) -> Result<Vec<PostingRow>, StoreError>;

    async fn count(&self) -> Result<u64, StoreError>;

    /// Atomically appends `external_id` to `applied_by` unless already present.
    async fn append_applicant(
        &self,
        posting_id: Uuid,
        external_id: &str,
    ) -> Result<AppendOutcome, StoreError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<UserProfileRow>, StoreError>;

    /// Fails with [`StoreError::DuplicateKey`] on a taken external id, email, or username.
    async fn insert(&self, user: &NewUserProfile) -> Result<UserProfileRow, StoreError>;

    /// Returns `None` when no profile matches `external_id`.
    async fn complete_onboarding(
        &self,
        external_id: &str,
        update: &OnboardingUpdate,
    ) -> Result<Option<UserProfileRow>, StoreError>;
}
