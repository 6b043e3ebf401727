//! Repository for covered GitHub repositories

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::Repository;

/// Repository for managing covered-repository records
pub struct RepositoriesRepo {
    pool: SqlitePool,
}

impl RepositoriesRepo {
    /// Create a new repositories repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or update a repository keyed by its GitHub repo id
    pub async fn upsert(
        &self,
        installation_id: i64,
        github_repo_id: i64,
        owner: &str,
        name: &str,
    ) -> Result<Repository> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO repositories (
                installation_id, github_repo_id, owner, name, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(github_repo_id) DO UPDATE SET
                installation_id = excluded.installation_id,
                owner = excluded.owner,
                name = excluded.name,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(installation_id)
        .bind(github_repo_id)
        .bind(owner)
        .bind(name)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        debug!(github_repo_id, owner, name, "Upserted repository");

        self.get_by_github_id(github_repo_id).await
    }

    /// Get a repository by its GitHub repo id
    pub async fn get_by_github_id(&self, github_repo_id: i64) -> Result<Repository> {
        sqlx::query_as::<_, Repository>("SELECT * FROM repositories WHERE github_repo_id = ?")
            .bind(github_repo_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => {
                    Error::NotFound(format!("Repository {} not found", github_repo_id))
                }
                e => e.into(),
            })
    }

    /// Look up a repository by owner and name
    pub async fn find_by_full_name(&self, owner: &str, name: &str) -> Result<Option<Repository>> {
        sqlx::query_as::<_, Repository>(
            "SELECT * FROM repositories WHERE owner = ? AND name = ?",
        )
        .bind(owner)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(Into::into)
    }

    /// List all repositories for an installation
    pub async fn list_by_installation(&self, installation_id: i64) -> Result<Vec<Repository>> {
        sqlx::query_as::<_, Repository>(
            "SELECT * FROM repositories WHERE installation_id = ? ORDER BY owner, name",
        )
        .bind(installation_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }

    /// Delete a repository by its GitHub repo id
    pub async fn delete_by_github_id(&self, github_repo_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM repositories WHERE github_repo_id = ?")
            .bind(github_repo_id)
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

    async fn seed_installation(db: &Database) -> i64 {
        db.installations()
            .upsert(1, "octo-org", "Organization")
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let (db, _temp) = setup_test_db().await;
        let installation_id = seed_installation(&db).await;
        let repo = db.repositories();

        let first = repo.upsert(installation_id, 555, "octo", "widgets").await.unwrap();
        let second = repo.upsert(installation_id, 555, "octo", "widgets").await.unwrap();
        assert_eq!(first.id, second.id);

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM repositories")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count.0, 1);
    }

    #[tokio::test]
    async fn test_find_by_full_name() {
        let (db, _temp) = setup_test_db().await;
        let installation_id = seed_installation(&db).await;
        let repo = db.repositories();

        repo.upsert(installation_id, 555, "octo", "widgets").await.unwrap();

        let found = repo.find_by_full_name("octo", "widgets").await.unwrap();
        assert!(found.is_some());
        assert_eq!(found.unwrap().github_repo_id, 555);

        let missing = repo.find_by_full_name("octo", "gadgets").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_cascade_from_installation() {
        let (db, _temp) = setup_test_db().await;
        let installation_id = seed_installation(&db).await;
        let repo = db.repositories();

        repo.upsert(installation_id, 555, "octo", "widgets").await.unwrap();

        db.installations().delete_by_github_id(1).await.unwrap();

        let found = repo.find_by_full_name("octo", "widgets").await.unwrap();
        assert!(found.is_none());
    }
}
