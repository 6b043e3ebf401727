//! Repository for review records
//!
//! Status updates are guarded in SQL so a review only moves forward through
//! `pending` -> `in_progress` -> one terminal status. Guarded updates return
//! whether a row actually transitioned; `false` means the review was already
//! past the requested state.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{NewReview, Review, ReviewCompletion};

const TERMINAL_GUARD: &str = "status NOT IN ('completed', 'failed', 'skipped')";

/// Repository for managing review records
pub struct ReviewsRepo {
    pool: SqlitePool,
}

impl ReviewsRepo {
    /// Create a new reviews repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new review row with status `pending`
    pub async fn create(&self, review: NewReview) -> Result<Review> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO reviews (
                repository_id, pr_number, head_sha, base_ref,
                status, trigger_kind, model, created_at
            )
            VALUES (?, ?, ?, ?, 'pending', ?, ?, ?)
            "#,
        )
        .bind(review.repository_id)
        .bind(review.pr_number)
        .bind(&review.head_sha)
        .bind(&review.base_ref)
        .bind(&review.trigger_kind)
        .bind(&review.model)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!(review_id = id, pr_number = review.pr_number, "Created review record");

        self.get(id).await
    }

    /// Get a review by id
    pub async fn get(&self, id: i64) -> Result<Review> {
        sqlx::query_as::<_, Review>("SELECT * FROM reviews WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => Error::NotFound(format!("Review {} not found", id)),
                e => e.into(),
            })
    }

    /// Move a `pending` review to `in_progress`, recording the merge base
    pub async fn mark_in_progress(&self, id: i64, merge_base_sha: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE reviews SET status = 'in_progress', merge_base_sha = ? \
             WHERE id = ? AND status = 'pending'",
        )
        .bind(merge_base_sha)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Record the derived patch id on a non-terminal review
    pub async fn set_patch_id(&self, id: i64, patch_id: &str) -> Result<bool> {
        let query = format!(
            "UPDATE reviews SET patch_id = ? WHERE id = ? AND {}",
            TERMINAL_GUARD
        );
        let result = sqlx::query(&query)
            .bind(patch_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Write the terminal `completed` status with the review outcome
    pub async fn complete(&self, id: i64, outcome: ReviewCompletion) -> Result<bool> {
        let now = Utc::now();

        let query = format!(
            r#"
            UPDATE reviews SET
                status = 'completed',
                verdict = ?,
                confidence = ?,
                body = ?,
                comment_count = ?,
                raw_output = ?,
                prompt_tokens = ?,
                completion_tokens = ?,
                latency_ms = ?,
                github_review_id = ?,
                github_comment_id = ?,
                completed_at = ?
            WHERE id = ? AND {}
            "#,
            TERMINAL_GUARD
        );

        let result = sqlx::query(&query)
            .bind(&outcome.verdict)
            .bind(outcome.confidence)
            .bind(&outcome.body)
            .bind(outcome.comment_count)
            .bind(&outcome.raw_output)
            .bind(outcome.prompt_tokens)
            .bind(outcome.completion_tokens)
            .bind(outcome.latency_ms)
            .bind(outcome.github_review_id)
            .bind(outcome.github_comment_id)
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Write the terminal `failed` status with an error message
    pub async fn fail(&self, id: i64, error_message: &str) -> Result<bool> {
        let now = Utc::now();

        let query = format!(
            "UPDATE reviews SET status = 'failed', error_message = ?, completed_at = ? \
             WHERE id = ? AND {}",
            TERMINAL_GUARD
        );
        let result = sqlx::query(&query)
            .bind(error_message)
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Most recent review for a PR, regardless of status
    pub async fn latest_for_pr(
        &self,
        repository_id: i64,
        pr_number: i64,
    ) -> Result<Option<Review>> {
        sqlx::query_as::<_, Review>(
            "SELECT * FROM reviews WHERE repository_id = ? AND pr_number = ? \
             ORDER BY id DESC LIMIT 1",
        )
        .bind(repository_id)
        .bind(pr_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(Into::into)
    }

    /// Most recent `pending`/`in_progress` review for a PR
    ///
    /// Used by the pipeline failure handler, which may run before any review
    /// row exists for the failing execution.
    pub async fn latest_active_for_pr(
        &self,
        repository_id: i64,
        pr_number: i64,
    ) -> Result<Option<Review>> {
        sqlx::query_as::<_, Review>(
            "SELECT * FROM reviews WHERE repository_id = ? AND pr_number = ? \
             AND status IN ('pending', 'in_progress') ORDER BY id DESC LIMIT 1",
        )
        .bind(repository_id)
        .bind(pr_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(Into::into)
    }

    /// List reviews for a PR, newest first
    pub async fn list_for_pr(&self, repository_id: i64, pr_number: i64) -> Result<Vec<Review>> {
        sqlx::query_as::<_, Review>(
            "SELECT * FROM reviews WHERE repository_id = ? AND pr_number = ? ORDER BY id DESC",
        )
        .bind(repository_id)
        .bind(pr_number)
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }
}
