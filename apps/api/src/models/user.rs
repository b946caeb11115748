use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileRow {
    pub id: Uuid,
    pub external_id: String,
    pub email: String,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub age: Option<i32>,
    pub skill: Option<String>,
    pub resume_reference: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfileRow {
    /// The declared skill, or `None` when unset or blank.
    pub fn skill(&self) -> Option<&str> {
        self.skill.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn has_resume(&self) -> bool {
        self.resume_reference
            .as_deref()
            .is_some_and(|r| !r.trim().is_empty())
    }
}

/// A profile provisioned from the identity provider's `user.created` event.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUserProfile {
    pub external_id: String,
    pub email: String,
    pub username: String,
}

/// Fields set when a user completes onboarding.
#[derive(Debug, Clone)]
pub struct OnboardingUpdate {
    pub first_name: String,
    pub last_name: String,
    pub age: i32,
    pub skill: String,
    pub resume_reference: String,
}
