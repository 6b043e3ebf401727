//! Database layer for magpie
//!
//! Provides persistence for installations, repositories, reviews, prompt
//! overrides, and pipeline run checkpoints.

pub mod error;
pub mod models;
pub mod repos;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub use error::{Error, Result};
pub use models::{
    Installation, NewPipelineRun, NewReview, NewReviewComment, PipelineRun, PromptOverride,
    Repository, Review, ReviewComment, ReviewCompletion, ReviewStatus, RunStatus, StepRecord,
};
pub use repos::{
    comments::ReviewCommentsRepo, installations::InstallationsRepo, overrides::PromptOverridesRepo,
    repositories::RepositoriesRepo, reviews::ReviewsRepo, runs::PipelineRunsRepo,
};

/// Database connection pool
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database connection from a file path
    pub async fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref();

        // Create parent directory if needed
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Io(format!("Failed to create database directory: {}", e)))?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path.display()))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        // Run migrations
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| Error::Migration(e.to_string()))?;

        Ok(Self { pool })
    }

    /// Get the default database path (~/.cache/magpie/magpie.db)
    pub fn default_path() -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| Error::Io("Could not determine cache directory".to_string()))?;
        Ok(cache_dir.join("magpie").join("magpie.db"))
    }

    /// Create a database connection at the default path
    pub async fn default() -> Result<Self> {
        Self::new(Self::default_path()?).await
    }

    /// Get the underlying connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Get the installations repository
    pub fn installations(&self) -> InstallationsRepo {
        InstallationsRepo::new(self.pool.clone())
    }

    /// Get the repositories repository
    pub fn repositories(&self) -> RepositoriesRepo {
        RepositoriesRepo::new(self.pool.clone())
    }

    /// Get the reviews repository
    pub fn reviews(&self) -> ReviewsRepo {
        ReviewsRepo::new(self.pool.clone())
    }

    /// Get the review comments repository
    pub fn review_comments(&self) -> ReviewCommentsRepo {
        ReviewCommentsRepo::new(self.pool.clone())
    }

    /// Get the prompt overrides repository
    pub fn prompt_overrides(&self) -> PromptOverridesRepo {
        PromptOverridesRepo::new(self.pool.clone())
    }

    /// Get the pipeline runs repository
    pub fn pipeline_runs(&self) -> PipelineRunsRepo {
        PipelineRunsRepo::new(self.pool.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_database_creation() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let _db = Database::new(&db_path).await.unwrap();
        assert!(db_path.exists());
    }

    #[tokio::test]
    async fn test_database_migrations() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let db = Database::new(&db_path).await.unwrap();

        // Verify tables exist
        for table in [
            "installations",
            "repositories",
            "reviews",
            "review_comments",
            "prompt_overrides",
            "pipeline_runs",
            "pipeline_steps",
        ] {
            let result: (i64,) = sqlx::query_as(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?",
            )
            .bind(table)
            .fetch_one(db.pool())
            .await
            .unwrap();
            assert_eq!(result.0, 1, "missing table {}", table);
        }
    }
}
