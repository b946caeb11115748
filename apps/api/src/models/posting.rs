use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Maximum stored description length, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 1000;

/// A job posting ingested from an external feed. `source_url` is unique.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PostingRow {
    pub id: Uuid,
    pub title: String,
    pub company: String,
    pub description: String,
    pub location: Option<String>,
    pub source_url: String,
    pub source_name: String,
    pub published_at: DateTime<Utc>,
    pub relevance_score: f64,
    /// External identity ids of users who applied. Treated as a set.
    pub applied_by: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PostingRow {
    pub fn has_applicant(&self, external_id: &str) -> bool {
        self.applied_by.iter().any(|a| a == external_id)
    }
}

/// Insert payload for a posting discovered during ingestion.
#[derive(Debug, Clone)]
pub struct NewPosting {
    pub title: String,
    pub company: String,
    pub description: String,
    pub location: Option<String>,
    pub source_url: String,
    pub source_name: String,
    pub published_at: DateTime<Utc>,
    pub relevance_score: f64,
}
