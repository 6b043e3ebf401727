//! Repository for per-repository prompt section overrides

use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::Result;
use crate::models::PromptOverride;

/// Repository for managing prompt override records
pub struct PromptOverridesRepo {
    pool: SqlitePool,
}

impl PromptOverridesRepo {
    /// Create a new prompt overrides repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Set the override content for a section key, replacing any previous value
    pub async fn set(
        &self,
        repository_id: i64,
        section_key: &str,
        content: &str,
    ) -> Result<PromptOverride> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO prompt_overrides (
                repository_id, section_key, content, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(repository_id, section_key) DO UPDATE SET
                content = excluded.content,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(repository_id)
        .bind(section_key)
        .bind(content)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let row = sqlx::query_as::<_, PromptOverride>(
            "SELECT * FROM prompt_overrides WHERE repository_id = ? AND section_key = ?",
        )
        .bind(repository_id)
        .bind(section_key)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    /// List all overrides for a repository
    pub async fn list_for_repository(&self, repository_id: i64) -> Result<Vec<PromptOverride>> {
        sqlx::query_as::<_, PromptOverride>(
            "SELECT * FROM prompt_overrides WHERE repository_id = ? ORDER BY section_key",
        )
        .bind(repository_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }

    /// Remove an override, restoring the section's default content
    pub async fn remove(&self, repository_id: i64, section_key: &str) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM prompt_overrides WHERE repository_id = ? AND section_key = ?",
        )
        .bind(repository_id)
        .bind(section_key)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use tempfile::TempDir;

    async fn setup_test_db() -> (Database, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::new(temp_dir.path().join("test.db")).await.unwrap();
        (db, temp_dir)
    }

    async fn seed_repository(db: &Database) -> i64 {
        let installation = db.installations().upsert(1, "octo", "User").await.unwrap();
        db.repositories()
            .upsert(installation.id, 555, "octo", "widgets")
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_set_replaces_existing() {
        let (db, _temp) = setup_test_db().await;
        let repository_id = seed_repository(&db).await;
        let repo = db.prompt_overrides();

        repo.set(repository_id, "guidelines", "Be strict about naming")
            .await
            .unwrap();
        let updated = repo
            .set(repository_id, "guidelines", "Focus on error handling")
            .await
            .unwrap();
        assert_eq!(updated.content, "Focus on error handling");

        let all = repo.list_for_repository(repository_id).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_list_sorted_by_key() {
        let (db, _temp) = setup_test_db().await;
        let repository_id = seed_repository(&db).await;
        let repo = db.prompt_overrides();

        repo.set(repository_id, "re_review", "b").await.unwrap();
        repo.set(repository_id, "focus_areas", "a").await.unwrap();

        let all = repo.list_for_repository(repository_id).await.unwrap();
        assert_eq!(all[0].section_key, "focus_areas");
        assert_eq!(all[1].section_key, "re_review");
    }

    #[tokio::test]
    async fn test_remove() {
        let (db, _temp) = setup_test_db().await;
        let repository_id = seed_repository(&db).await;
        let repo = db.prompt_overrides();

        repo.set(repository_id, "guidelines", "x").await.unwrap();
        assert!(repo.remove(repository_id, "guidelines").await.unwrap());
        assert!(!repo.remove(repository_id, "guidelines").await.unwrap());
        assert!(repo.list_for_repository(repository_id).await.unwrap().is_empty());
    }
}
