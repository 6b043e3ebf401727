//! Data models for database records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a review record
///
/// Advances forward only: `pending` -> `in_progress` -> one terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Skipped,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::InProgress => "in_progress",
            ReviewStatus::Completed => "completed",
            ReviewStatus::Failed => "failed",
            ReviewStatus::Skipped => "skipped",
        }
    }

    /// Whether this status ends the review's lifecycle
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ReviewStatus::Completed | ReviewStatus::Failed | ReviewStatus::Skipped
        )
    }
}

/// Status of a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    Running,
    Completed,
    Failed,
    Skipped,
}

impl RunStatus {
    pub fn as_str(&self) -> &str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Skipped => "skipped",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Completed | RunStatus::Failed | RunStatus::Skipped
        )
    }
}

/// GitHub App installation
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Installation {
    pub id: i64,
    pub github_installation_id: i64,
    pub account_login: String,
    pub account_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Repository covered by an installation
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Repository {
    pub id: i64,
    pub installation_id: i64,
    pub github_repo_id: i64,
    pub owner: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Repository {
    /// Full name in `owner/name` form
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// Review record, one per pipeline execution that reached review creation
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Review {
    pub id: i64,
    pub repository_id: i64,
    pub pr_number: i64,
    pub head_sha: String,
    pub base_ref: String,
    pub merge_base_sha: Option<String>,
    pub patch_id: Option<String>,
    pub status: String,
    pub trigger_kind: String,
    pub model: Option<String>,
    pub verdict: Option<String>,
    pub confidence: Option<f64>,
    pub body: Option<String>,
    pub comment_count: i64,
    pub raw_output: Option<String>,
    pub prompt_tokens: Option<i64>,
    pub completion_tokens: Option<i64>,
    pub latency_ms: Option<i64>,
    pub error_message: Option<String>,
    pub github_review_id: Option<i64>,
    pub github_comment_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Review {
    /// Whether the review has reached a terminal status
    pub fn is_terminal(&self) -> bool {
        matches!(self.status.as_str(), "completed" | "failed" | "skipped")
    }
}

/// Fields required to insert a new review row
#[derive(Debug, Clone)]
pub struct NewReview {
    pub repository_id: i64,
    pub pr_number: i64,
    pub head_sha: String,
    pub base_ref: String,
    pub trigger_kind: String,
    pub model: Option<String>,
}

/// Terminal outcome written when a review completes successfully
#[derive(Debug, Clone, Default)]
pub struct ReviewCompletion {
    pub verdict: String,
    pub confidence: Option<f64>,
    pub body: String,
    pub comment_count: i64,
    pub raw_output: String,
    pub prompt_tokens: Option<i64>,
    pub completion_tokens: Option<i64>,
    pub latency_ms: Option<i64>,
    pub github_review_id: Option<i64>,
    pub github_comment_id: Option<i64>,
}

/// Inline comment produced by a completed review
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ReviewComment {
    pub id: i64,
    pub review_id: i64,
    pub path: String,
    pub line: i64,
    pub body: String,
    pub suggestion: Option<String>,
    pub side: String,
    pub posted: bool,
    pub github_comment_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Fields required to insert an inline review comment
#[derive(Debug, Clone)]
pub struct NewReviewComment {
    pub review_id: i64,
    pub path: String,
    pub line: i64,
    pub body: String,
    pub suggestion: Option<String>,
    pub side: String,
    pub posted: bool,
    pub github_comment_id: Option<i64>,
}

/// Per-repository replacement for an overridable prompt section
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PromptOverride {
    pub id: i64,
    pub repository_id: i64,
    pub section_key: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Durable record of one triggered pipeline execution
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PipelineRun {
    pub id: String,
    pub installation_id: i64,
    pub owner: String,
    pub repo: String,
    pub pr_number: i64,
    pub head_sha: Option<String>,
    pub base_ref: Option<String>,
    pub trigger_kind: String,
    pub requested_by: Option<String>,
    pub status: String,
    pub skip_reason: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl PipelineRun {
    /// Whether the run has reached a terminal status
    pub fn is_terminal(&self) -> bool {
        matches!(self.status.as_str(), "completed" | "failed" | "skipped")
    }
}

/// Fields required to insert a pipeline run
#[derive(Debug, Clone)]
pub struct NewPipelineRun {
    pub id: String,
    pub installation_id: i64,
    pub owner: String,
    pub repo: String,
    pub pr_number: i64,
    pub head_sha: Option<String>,
    pub base_ref: Option<String>,
    pub trigger_kind: String,
    pub requested_by: Option<String>,
}

/// Checkpointed output of a completed pipeline step
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StepRecord {
    pub run_id: String,
    pub step: String,
    pub output_json: String,
    pub attempts: i64,
    pub completed_at: DateTime<Utc>,
}
