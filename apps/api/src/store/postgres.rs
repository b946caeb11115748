use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::posting::{NewPosting, PostingRow};
use crate::models::user::{NewUserProfile, OnboardingUpdate, UserProfileRow};
use crate::store::{AppendOutcome, PostingStore, StoreError, UserStore};

/// PostgreSQL-backed store. Uniqueness is enforced by the schema's
/// UNIQUE constraints, never by read-then-write checks.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Maps unique-constraint violations to [`StoreError::DuplicateKey`].
fn map_write_error(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return StoreError::DuplicateKey(db.constraint().unwrap_or("unique").to_string());
        }
    }
    StoreError::Unavailable(e)
}

#[async_trait]
impl PostingStore for PgStore {
    async fn find_by_url(&self, source_url: &str) -> Result<Option<PostingRow>, StoreError> {
        Ok(
            sqlx::query_as::<_, PostingRow>("SELECT * FROM postings WHERE source_url = $1")
                .bind(source_url)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostingRow>, StoreError> {
        Ok(
            sqlx::query_as::<_, PostingRow>("SELECT * FROM postings WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn insert(&self, posting: &NewPosting) -> Result<PostingRow, StoreError> {
        sqlx::query_as::<_, PostingRow>(
            r#"
            INSERT INTO postings
                (id, title, company, description, location, source_url,
                 source_name, published_at, relevance_score)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&posting.title)
        .bind(&posting.company)
        .bind(&posting.description)
        .bind(&posting.location)
        .bind(&posting.source_url)
        .bind(&posting.source_name)
        .bind(posting.published_at)
        .bind(posting.relevance_score)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)
    }

    async fn update_score(&self, id: Uuid, relevance_score: f64) -> Result<(), StoreError> {
        sqlx::query("UPDATE postings SET relevance_score = $1, updated_at = now() WHERE id = $2")
            .bind(relevance_score)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_ranked(&self, limit: usize) -> Result<Vec<PostingRow>, StoreError> {
        Ok(sqlx::query_as::<_, PostingRow>(
            "SELECT * FROM postings ORDER BY relevance_score DESC, published_at DESC LIMIT $1",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM postings")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn append_applicant(
        &self,
        posting_id: Uuid,
        external_id: &str,
    ) -> Result<AppendOutcome, StoreError> {
        // Conditional append: concurrent retries re-evaluate the predicate
        // against the committed row, so the id is added at most once.
        let appended: Option<String> = sqlx::query_scalar(
            r#"
            UPDATE postings
            SET applied_by = array_append(applied_by, $2), updated_at = now()
            WHERE id = $1 AND NOT ($2 = ANY(applied_by))
            RETURNING source_url
            "#,
        )
        .bind(posting_id)
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(source_url) = appended {
            return Ok(AppendOutcome::Appended { source_url });
        }

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM postings WHERE id = $1)")
            .bind(posting_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(if exists {
            AppendOutcome::AlreadyPresent
        } else {
            AppendOutcome::PostingMissing
        })
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<UserProfileRow>, StoreError> {
        Ok(sqlx::query_as::<_, UserProfileRow>(
            "SELECT * FROM user_profiles WHERE external_id = $1",
        )
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn insert(&self, user: &NewUserProfile) -> Result<UserProfileRow, StoreError> {
        sqlx::query_as::<_, UserProfileRow>(
            r#"
            INSERT INTO user_profiles (id, external_id, email, username)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.external_id)
        .bind(&user.email)
        .bind(&user.username)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)
    }

    async fn complete_onboarding(
        &self,
        external_id: &str,
        update: &OnboardingUpdate,
    ) -> Result<Option<UserProfileRow>, StoreError> {
        Ok(sqlx::query_as::<_, UserProfileRow>(
            r#"
            UPDATE user_profiles
            SET first_name = $2, last_name = $3, age = $4, skill = $5,
                resume_reference = $6, updated_at = now()
            WHERE external_id = $1
            RETURNING *
            "#,
        )
        .bind(external_id)
        .bind(&update.first_name)
        .bind(&update.last_name)
        .bind(update.age)
        .bind(&update.skill)
        .bind(&update.resume_reference)
        .fetch_optional(&self.pool)
        .await?)
    }
}
