//! Repository for pipeline runs and their step checkpoint log
//!
//! A run row tracks one triggered pipeline execution end to end. The step
//! log persists each completed step's output keyed by (run id, step name),
//! which is what makes runs resumable after a crash: the driver replays
//! logged steps from their stored output instead of re-executing them.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{NewPipelineRun, PipelineRun, StepRecord};

const TERMINAL_GUARD: &str = "status NOT IN ('completed', 'failed', 'skipped')";

/// Repository for managing pipeline run records
pub struct PipelineRunsRepo {
    pool: SqlitePool,
}

impl PipelineRunsRepo {
    /// Create a new pipeline runs repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new run with status `queued`
    pub async fn create(&self, run: NewPipelineRun) -> Result<PipelineRun> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO pipeline_runs (
                id, installation_id, owner, repo, pr_number, head_sha, base_ref,
                trigger_kind, requested_by, status, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 'queued', ?, ?)
            "#,
        )
        .bind(&run.id)
        .bind(run.installation_id)
        .bind(&run.owner)
        .bind(&run.repo)
        .bind(run.pr_number)
        .bind(&run.head_sha)
        .bind(&run.base_ref)
        .bind(&run.trigger_kind)
        .bind(&run.requested_by)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        debug!(run_id = %run.id, pr_number = run.pr_number, "Created pipeline run");

        self.get(&run.id).await
    }

    /// Get a run by id
    pub async fn get(&self, id: &str) -> Result<PipelineRun> {
        sqlx::query_as::<_, PipelineRun>("SELECT * FROM pipeline_runs WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => Error::NotFound(format!("Run {} not found", id)),
                e => e.into(),
            })
    }

    /// Mark a run as running; idempotent for runs resumed mid-flight
    pub async fn mark_running(&self, id: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE pipeline_runs SET status = 'running', updated_at = ? \
             WHERE id = ? AND status IN ('queued', 'running')",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Write the terminal `completed` status
    pub async fn mark_completed(&self, id: &str) -> Result<bool> {
        let now = Utc::now();
        let query = format!(
            "UPDATE pipeline_runs SET status = 'completed', updated_at = ?, completed_at = ? \
             WHERE id = ? AND {}",
            TERMINAL_GUARD
        );
        let result = sqlx::query(&query)
            .bind(now)
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Write the terminal `skipped` status with a machine-readable reason
    pub async fn mark_skipped(&self, id: &str, reason: &str) -> Result<bool> {
        let now = Utc::now();
        let query = format!(
            "UPDATE pipeline_runs SET status = 'skipped', skip_reason = ?, updated_at = ?, \
             completed_at = ? WHERE id = ? AND {}",
            TERMINAL_GUARD
        );
        let result = sqlx::query(&query)
            .bind(reason)
            .bind(now)
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Write the terminal `failed` status with the error text
    pub async fn mark_failed(&self, id: &str, error_message: &str) -> Result<bool> {
        let now = Utc::now();
        let query = format!(
            "UPDATE pipeline_runs SET status = 'failed', error_message = ?, updated_at = ?, \
             completed_at = ? WHERE id = ? AND {}",
            TERMINAL_GUARD
        );
        let result = sqlx::query(&query)
            .bind(error_message)
            .bind(now)
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Runs that have not reached a terminal status, oldest first
    pub async fn find_incomplete(&self) -> Result<Vec<PipelineRun>> {
        sqlx::query_as::<_, PipelineRun>(
            "SELECT * FROM pipeline_runs WHERE status IN ('queued', 'running') \
             ORDER BY created_at ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }

    /// Checkpoint a completed step's output, replacing any earlier attempt
    pub async fn record_step(
        &self,
        run_id: &str,
        step: &str,
        output_json: &str,
        attempts: i64,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO pipeline_steps (run_id, step, output_json, attempts, completed_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(run_id)
        .bind(step)
        .bind(output_json)
        .bind(attempts)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        debug!(run_id = %run_id, step, "Checkpointed step output");
        Ok(())
    }

    /// Fetch the checkpoint for one step, if it completed
    pub async fn find_step(&self, run_id: &str, step: &str) -> Result<Option<StepRecord>> {
        sqlx::query_as::<_, StepRecord>(
            "SELECT * FROM pipeline_steps WHERE run_id = ? AND step = ?",
        )
        .bind(run_id)
        .bind(step)
        .fetch_optional(&self.pool)
        .await
        .map_err(Into::into)
    }

    /// List all checkpointed steps for a run, in completion order
    pub async fn list_steps(&self, run_id: &str) -> Result<Vec<StepRecord>> {
        sqlx::query_as::<_, StepRecord>(
            "SELECT * FROM pipeline_steps WHERE run_id = ? ORDER BY completed_at ASC",
        )
        .bind(run_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use tempfile::TempDir;
    use uuid::Uuid;

    async fn setup_test_db() -> (Database, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::new(temp_dir.path().join("test.db")).await.unwrap();
        (db, temp_dir)
    }

    fn new_run() -> NewPipelineRun {
        NewPipelineRun {
            id: Uuid::new_v4().to_string(),
            installation_id: 1,
            owner: "octo".to_string(),
            repo: "widgets".to_string(),
            pr_number: 10,
            head_sha: Some("abc123".to_string()),
            base_ref: Some("main".to_string()),
            trigger_kind: "push".to_string(),
            requested_by: Some("alice".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_starts_queued() {
        let (db, _temp) = setup_test_db().await;
        let repo = db.pipeline_runs();

        let run = repo.create(new_run()).await.unwrap();
        assert_eq!(run.status, "queued");
        assert!(run.completed_at.is_none());
    }

    #[tokio::test]
    async fn test_mark_running_is_idempotent() {
        let (db, _temp) = setup_test_db().await;
        let repo = db.pipeline_runs();

        let run = repo.create(new_run()).await.unwrap();
        assert!(repo.mark_running(&run.id).await.unwrap());
        // A resumed run is already running; the transition must still succeed
        assert!(repo.mark_running(&run.id).await.unwrap());

        repo.mark_completed(&run.id).await.unwrap();
        assert!(!repo.mark_running(&run.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_terminal_status_sticks() {
        let (db, _temp) = setup_test_db().await;
        let repo = db.pipeline_runs();

        let run = repo.create(new_run()).await.unwrap();
        assert!(repo.mark_skipped(&run.id, "draft").await.unwrap());
        assert!(!repo.mark_failed(&run.id, "nope").await.unwrap());
        assert!(!repo.mark_completed(&run.id).await.unwrap());

        let stored = repo.get(&run.id).await.unwrap();
        assert_eq!(stored.status, "skipped");
        assert_eq!(stored.skip_reason.as_deref(), Some("draft"));
    }

    #[tokio::test]
    async fn test_find_incomplete_excludes_terminal() {
        let (db, _temp) = setup_test_db().await;
        let repo = db.pipeline_runs();

        let queued = repo.create(new_run()).await.unwrap();
        let running = repo.create(new_run()).await.unwrap();
        repo.mark_running(&running.id).await.unwrap();
        let done = repo.create(new_run()).await.unwrap();
        repo.mark_completed(&done.id).await.unwrap();

        let incomplete = repo.find_incomplete().await.unwrap();
        let ids: Vec<&str> = incomplete.iter().map(|r| r.id.as_str()).collect();
        assert!(ids.contains(&queued.id.as_str()));
        assert!(ids.contains(&running.id.as_str()));
        assert!(!ids.contains(&done.id.as_str()));
    }

    #[tokio::test]
    async fn test_step_checkpoint_roundtrip() {
        let (db, _temp) = setup_test_db().await;
        let repo = db.pipeline_runs();

        let run = repo.create(new_run()).await.unwrap();
        assert!(repo.find_step(&run.id, "fetch_pr").await.unwrap().is_none());

        repo.record_step(&run.id, "fetch_pr", r#"{"title":"Add widget"}"#, 1)
            .await
            .unwrap();

        let record = repo.find_step(&run.id, "fetch_pr").await.unwrap().unwrap();
        assert_eq!(record.output_json, r#"{"title":"Add widget"}"#);
        assert_eq!(record.attempts, 1);

        // Re-recording the same step replaces the checkpoint
        repo.record_step(&run.id, "fetch_pr", r#"{"title":"Add widget v2"}"#, 2)
            .await
            .unwrap();
        let record = repo.find_step(&run.id, "fetch_pr").await.unwrap().unwrap();
        assert_eq!(record.attempts, 2);
        assert_eq!(repo.list_steps(&run.id).await.unwrap().len(), 1);
    }
}
