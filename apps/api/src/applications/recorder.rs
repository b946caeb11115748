//! Application Recorder: records that a user applied to a posting.
//!
//! Preconditions are checked in order (user, résumé, posting, prior
//! application) so callers always see the most fundamental failure first.
//! The write itself is a single conditional append, so concurrent or
//! retried requests never produce a duplicate `applied_by` entry.

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::store::{AppendOutcome, PostingStore, StoreError, UserStore};

#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("User not found")]
    UserNotFound,

    #[error("Please upload your resume first")]
    ResumeMissing,

    #[error("Posting not found")]
    PostingNotFound,

    #[error("You have already applied to this posting")]
    AlreadyApplied,

    #[error(transparent)]
    Persistence(#[from] StoreError),
}

/// Appends `external_id` to the posting's applicants and returns the
/// posting's source URL.
pub async fn apply(
    users: &dyn UserStore,
    postings: &dyn PostingStore,
    external_id: &str,
    posting_id: Uuid,
) -> Result<String, ApplyError> {
    let user = users
        .find_by_external_id(external_id)
        .await?
        .ok_or(ApplyError::UserNotFound)?;

    if !user.has_resume() {
        return Err(ApplyError::ResumeMissing);
    }

    let posting = postings
        .find_by_id(posting_id)
        .await?
        .ok_or(ApplyError::PostingNotFound)?;

    if posting.has_applicant(external_id) {
        return Err(ApplyError::AlreadyApplied);
    }

    match postings.append_applicant(posting_id, external_id).await? {
        AppendOutcome::Appended { source_url } => {
            info!("User {external_id} applied to posting {posting_id}");
            Ok(source_url)
        }
        AppendOutcome::AlreadyPresent => Err(ApplyError::AlreadyApplied),
        AppendOutcome::PostingMissing => Err(ApplyError::PostingNotFound),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;

    use super::*;
    use crate::models::posting::NewPosting;
    use crate::store::memory::{test_user, InMemoryStore};

    async fn seed_posting(store: &InMemoryStore, url: &str) -> Uuid {
        let posting = NewPosting {
            title: "Backend Engineer".to_string(),
            company: "Acme".to_string(),
            description: "Rust services".to_string(),
            location: Some("Remote".to_string()),
            source_url: url.to_string(),
            source_name: "Feed".to_string(),
            published_at: Utc::now(),
            relevance_score: 0.0,
        };
        PostingStore::insert(store, &posting).await.unwrap().id
    }

    #[tokio::test]
    async fn test_apply_records_applicant_and_returns_url() {
        let store = InMemoryStore::new();
        store.put_user(test_user("user_1", Some("rust"), Some("resumes/user_1.pdf")));
        let id = seed_posting(&store, "https://jobs.example/1").await;

        let url = apply(&store, &store, "user_1", id).await.unwrap();

        assert_eq!(url, "https://jobs.example/1");
        let posting = store.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(posting.applied_by, vec!["user_1".to_string()]);
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_found() {
        let store = InMemoryStore::new();
        let id = seed_posting(&store, "https://jobs.example/1").await;
        let err = apply(&store, &store, "ghost", id).await.unwrap_err();
        assert!(matches!(err, ApplyError::UserNotFound));
    }

    #[tokio::test]
    async fn test_missing_resume_checked_before_posting() {
        let store = InMemoryStore::new();
        store.put_user(test_user("user_1", None, None));

        // Posting does not exist either; the résumé precondition wins.
        let err = apply(&store, &store, "user_1", Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, ApplyError::ResumeMissing));

        let id = seed_posting(&store, "https://jobs.example/1").await;
        let err = apply(&store, &store, "user_1", id).await.unwrap_err();
        assert!(matches!(err, ApplyError::ResumeMissing));
    }

    #[tokio::test]
    async fn test_blank_resume_reference_counts_as_missing() {
        let store = InMemoryStore::new();
        store.put_user(test_user("user_1", None, Some("  ")));
        let id = seed_posting(&store, "https://jobs.example/1").await;
        let err = apply(&store, &store, "user_1", id).await.unwrap_err();
        assert!(matches!(err, ApplyError::ResumeMissing));
    }

    #[tokio::test]
    async fn test_unknown_posting_is_not_found() {
        let store = InMemoryStore::new();
        store.put_user(test_user("user_1", None, Some("resumes/r.pdf")));
        let err = apply(&store, &store, "user_1", Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, ApplyError::PostingNotFound));
    }

    #[tokio::test]
    async fn test_second_apply_conflicts() {
        let store = InMemoryStore::new();
        store.put_user(test_user("user_1", None, Some("resumes/r.pdf")));
        let id = seed_posting(&store, "https://jobs.example/1").await;

        apply(&store, &store, "user_1", id).await.unwrap();
        let err = apply(&store, &store, "user_1", id).await.unwrap_err();

        assert!(matches!(err, ApplyError::AlreadyApplied));
        let posting = store.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(posting.applied_by.len(), 1);
    }

    #[tokio::test]
    async fn test_different_users_both_recorded() {
        let store = InMemoryStore::new();
        store.put_user(test_user("user_1", None, Some("resumes/a.pdf")));
        store.put_user(test_user("user_2", None, Some("resumes/b.pdf")));
        let id = seed_posting(&store, "https://jobs.example/1").await;

        apply(&store, &store, "user_1", id).await.unwrap();
        apply(&store, &store, "user_2", id).await.unwrap();

        let posting = store.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(posting.applied_by, vec!["user_1", "user_2"]);
    }

    #[tokio::test]
    async fn test_concurrent_applies_record_once() {
        let store = Arc::new(InMemoryStore::new());
        store.put_user(test_user("user_1", None, Some("resumes/r.pdf")));
        let id = seed_posting(&store, "https://jobs.example/1").await;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                apply(store.as_ref(), store.as_ref(), "user_1", id).await
            }));
        }

        let mut succeeded = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => succeeded += 1,
                Err(ApplyError::AlreadyApplied) => {}
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(succeeded, 1);
        let posting = store.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(posting.applied_by, vec!["user_1"]);
    }
}
