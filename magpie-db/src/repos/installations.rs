//! Repository for GitHub App installation records

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::Installation;

/// Repository for managing installation records
pub struct InstallationsRepo {
    pool: SqlitePool,
}

impl InstallationsRepo {
    /// Create a new installations repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or update an installation keyed by its GitHub installation id
    pub async fn upsert(
        &self,
        github_installation_id: i64,
        account_login: &str,
        account_type: &str,
    ) -> Result<Installation> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO installations (
                github_installation_id, account_login, account_type, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(github_installation_id) DO UPDATE SET
                account_login = excluded.account_login,
                account_type = excluded.account_type,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(github_installation_id)
        .bind(account_login)
        .bind(account_type)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        debug!(github_installation_id, account_login, "Upserted installation");

        self.get_by_github_id(github_installation_id).await
    }

    /// Get an installation by its GitHub installation id
    pub async fn get_by_github_id(&self, github_installation_id: i64) -> Result<Installation> {
        sqlx::query_as::<_, Installation>(
            "SELECT * FROM installations WHERE github_installation_id = ?",
        )
        .bind(github_installation_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                Error::NotFound(format!("Installation {} not found", github_installation_id))
            }
            e => e.into(),
        })
    }

    /// Delete an installation (and, via cascade, its repositories)
    pub async fn delete_by_github_id(&self, github_installation_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM installations WHERE github_installation_id = ?")
            .bind(github_installation_id)
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

    #[tokio::test]
    async fn test_upsert_creates_then_updates() {
        let (db, _temp) = setup_test_db().await;
        let repo = db.installations();

        let created = repo.upsert(100, "octo-org", "Organization").await.unwrap();
        assert_eq!(created.github_installation_id, 100);
        assert_eq!(created.account_login, "octo-org");

        // Second upsert with the same id must update in place, not duplicate
        let updated = repo.upsert(100, "octo-org-renamed", "Organization").await.unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.account_login, "octo-org-renamed");

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM installations")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count.0, 1);
    }

    #[tokio::test]
    async fn test_get_missing_installation() {
        let (db, _temp) = setup_test_db().await;
        let repo = db.installations();

        let result = repo.get_by_github_id(999).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_installation() {
        let (db, _temp) = setup_test_db().await;
        let repo = db.installations();

        repo.upsert(7, "alice", "User").await.unwrap();
        assert!(repo.delete_by_github_id(7).await.unwrap());
        assert!(!repo.delete_by_github_id(7).await.unwrap());
    }
}
