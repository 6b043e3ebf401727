//! Repository for inline review comments

use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::Result;
use crate::models::{NewReviewComment, ReviewComment};

/// Repository for managing inline review comment records
pub struct ReviewCommentsRepo {
    pool: SqlitePool,
}

impl ReviewCommentsRepo {
    /// Create a new review comments repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a batch of comments for a completed review in one transaction
    pub async fn insert_many(&self, comments: &[NewReviewComment]) -> Result<usize> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        for comment in comments {
            sqlx::query(
                r#"
                INSERT INTO review_comments (
                    review_id, path, line, body, suggestion, side,
                    posted, github_comment_id, created_at
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(comment.review_id)
            .bind(&comment.path)
            .bind(comment.line)
            .bind(&comment.body)
            .bind(&comment.suggestion)
            .bind(&comment.side)
            .bind(comment.posted)
            .bind(comment.github_comment_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(comments.len())
    }

    /// List all comments for a review, in file/line order
    pub async fn list_for_review(&self, review_id: i64) -> Result<Vec<ReviewComment>> {
        sqlx::query_as::<_, ReviewComment>(
            "SELECT * FROM review_comments WHERE review_id = ? ORDER BY path, line",
        )
        .bind(review_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }

    /// Count comments for a review
    pub async fn count_for_review(&self, review_id: i64) -> Result<i64> {
        let row: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM review_comments WHERE review_id = ?")
                .bind(review_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(row.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewReview;
    use crate::Database;
    use tempfile::TempDir;

    async fn setup_test_db() -> (Database, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::new(temp_dir.path().join("test.db")).await.unwrap();
        (db, temp_dir)
    }

    async fn seed_review(db: &Database) -> i64 {
        let installation = db.installations().upsert(1, "octo", "User").await.unwrap();
        let repository = db
            .repositories()
            .upsert(installation.id, 555, "octo", "widgets")
            .await
            .unwrap();
        db.reviews()
            .create(NewReview {
                repository_id: repository.id,
                pr_number: 10,
                head_sha: "abc123".to_string(),
                base_ref: "main".to_string(),
                trigger_kind: "push".to_string(),
                model: None,
            })
            .await
            .unwrap()
            .id
    }

    fn new_comment(review_id: i64, path: &str, line: i64) -> NewReviewComment {
        NewReviewComment {
            review_id,
            path: path.to_string(),
            line,
            body: "Consider handling the error".to_string(),
            suggestion: None,
            side: "RIGHT".to_string(),
            posted: true,
            github_comment_id: None,
        }
    }

    #[tokio::test]
    async fn test_insert_many_and_list() {
        let (db, _temp) = setup_test_db().await;
        let review_id = seed_review(&db).await;
        let repo = db.review_comments();

        let inserted = repo
            .insert_many(&[
                new_comment(review_id, "src/lib.rs", 42),
                new_comment(review_id, "src/main.rs", 7),
                new_comment(review_id, "src/lib.rs", 10),
            ])
            .await
            .unwrap();
        assert_eq!(inserted, 3);

        let comments = repo.list_for_review(review_id).await.unwrap();
        assert_eq!(comments.len(), 3);
        // Ordered by path then line
        assert_eq!(comments[0].path, "src/lib.rs");
        assert_eq!(comments[0].line, 10);
        assert_eq!(comments[2].path, "src/main.rs");
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let (db, _temp) = setup_test_db().await;
        let review_id = seed_review(&db).await;
        let repo = db.review_comments();

        assert_eq!(repo.insert_many(&[]).await.unwrap(), 0);
        assert_eq!(repo.count_for_review(review_id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_cascade_delete_with_review() {
        let (db, _temp) = setup_test_db().await;
        let review_id = seed_review(&db).await;
        let repo = db.review_comments();

        repo.insert_many(&[new_comment(review_id, "src/lib.rs", 1)])
            .await
            .unwrap();

        sqlx::query("DELETE FROM reviews WHERE id = ?")
            .bind(review_id)
            .execute(db.pool())
            .await
            .unwrap();

        assert_eq!(repo.count_for_review(review_id).await.unwrap(), 0);
    }
}
