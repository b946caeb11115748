//! In-memory store used by unit and router tests.
//!
//! Uses `Vec`s behind `std::sync::RwLock`. Unique keys are checked under the
//! write lock, mirroring the database constraints.

use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::models::posting::{NewPosting, PostingRow};
use crate::models::user::{NewUserProfile, OnboardingUpdate, UserProfileRow};
use crate::store::{AppendOutcome, PostingStore, StoreError, UserStore};

#[derive(Default)]
pub struct InMemoryStore {
    postings: RwLock<Vec<PostingRow>>,
    users: RwLock<Vec<UserProfileRow>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a profile directly, bypassing the webhook flow.
    pub fn put_user(&self, user: UserProfileRow) {
        self.users.write().unwrap().push(user);
    }

    pub fn postings_snapshot(&self) -> Vec<PostingRow> {
        self.postings.read().unwrap().clone()
    }
}

#[async_trait]
impl PostingStore for InMemoryStore {
    async fn find_by_url(&self, source_url: &str) -> Result<Option<PostingRow>, StoreError> {
        let postings = self.postings.read().unwrap();
        Ok(postings.iter().find(|p| p.source_url == source_url).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostingRow>, StoreError> {
        let postings = self.postings.read().unwrap();
        Ok(postings.iter().find(|p| p.id == id).cloned())
    }

    async fn insert(&self, posting: &NewPosting) -> Result<PostingRow, StoreError> {
        let mut postings = self.postings.write().unwrap();
        if postings.iter().any(|p| p.source_url == posting.source_url) {
            return Err(StoreError::DuplicateKey("postings_source_url_key".to_string()));
        }
        let now = Utc::now();
        let row = PostingRow {
            id: Uuid::new_v4(),
            title: posting.title.clone(),
            company: posting.company.clone(),
            description: posting.description.clone(),
            location: posting.location.clone(),
            source_url: posting.source_url.clone(),
            source_name: posting.source_name.clone(),
            published_at: posting.published_at,
            relevance_score: posting.relevance_score,
            applied_by: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        postings.push(row.clone());
        Ok(row)
    }

    async fn update_score(&self, id: Uuid, relevance_score: f64) -> Result<(), StoreError> {
        let mut postings = self.postings.write().unwrap();
        if let Some(p) = postings.iter_mut().find(|p| p.id == id) {
            p.relevance_score = relevance_score;
            p.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn list_ranked(&self, limit: usize) -> Result<Vec<PostingRow>, StoreError> {
        let mut postings = self.postings.read().unwrap().clone();
        postings.sort_by(|a, b| {
            b.relevance_score
                .total_cmp(&a.relevance_score)
                .then_with(|| b.published_at.cmp(&a.published_at))
        });
        postings.truncate(limit);
        Ok(postings)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.postings.read().unwrap().len() as u64)
    }

    async fn append_applicant(
        &self,
        posting_id: Uuid,
        external_id: &str,
    ) -> Result<AppendOutcome, StoreError> {
        let mut postings = self.postings.write().unwrap();
        let Some(posting) = postings.iter_mut().find(|p| p.id == posting_id) else {
            return Ok(AppendOutcome::PostingMissing);
        };
        if posting.has_applicant(external_id) {
            return Ok(AppendOutcome::AlreadyPresent);
        }
        posting.applied_by.push(external_id.to_string());
        posting.updated_at = Utc::now();
        Ok(AppendOutcome::Appended {
            source_url: posting.source_url.clone(),
        })
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<UserProfileRow>, StoreError> {
        let users = self.users.read().unwrap();
        Ok(users.iter().find(|u| u.external_id == external_id).cloned())
    }

    async fn insert(&self, user: &NewUserProfile) -> Result<UserProfileRow, StoreError> {
        let mut users = self.users.write().unwrap();
        if users.iter().any(|u| {
            u.external_id == user.external_id || u.email == user.email || u.username == user.username
        }) {
            return Err(StoreError::DuplicateKey("user_profiles_unique".to_string()));
        }
        let now = Utc::now();
        let row = UserProfileRow {
            id: Uuid::new_v4(),
            external_id: user.external_id.clone(),
            email: user.email.clone(),
            username: user.username.clone(),
            first_name: None,
            last_name: None,
            age: None,
            skill: None,
            resume_reference: None,
            created_at: now,
            updated_at: now,
        };
        users.push(row.clone());
        Ok(row)
    }

    async fn complete_onboarding(
        &self,
        external_id: &str,
        update: &OnboardingUpdate,
    ) -> Result<Option<UserProfileRow>, StoreError> {
        let mut users = self.users.write().unwrap();
        let Some(user) = users.iter_mut().find(|u| u.external_id == external_id) else {
            return Ok(None);
        };
        user.first_name = Some(update.first_name.clone());
        user.last_name = Some(update.last_name.clone());
        user.age = Some(update.age);
        user.skill = Some(update.skill.clone());
        user.resume_reference = Some(update.resume_reference.clone());
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }
}

/// Builds a profile row for tests.
pub fn test_user(external_id: &str, skill: Option<&str>, resume: Option<&str>) -> UserProfileRow {
    let now = Utc::now();
    UserProfileRow {
        id: Uuid::new_v4(),
        external_id: external_id.to_string(),
        email: format!("{external_id}@example.com"),
        username: external_id.to_string(),
        first_name: Some("Test".to_string()),
        last_name: Some("User".to_string()),
        age: Some(30),
        skill: skill.map(String::from),
        resume_reference: resume.map(String::from),
        created_at: now,
        updated_at: now,
    }
}
