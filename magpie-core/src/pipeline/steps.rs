//! Step names and checkpointed step outputs
//!
//! Each step's output is serialized to JSON and written to the step log
//! before the next step starts. The shapes here are the durable contract: a
//! resumed run deserializes them instead of redoing the work, so changes must
//! stay backward compatible with checkpoints already on disk.

use serde::{Deserialize, Serialize};

use crate::host::PullRequestInfo;
use crate::threads::CommentThread;

/// The pipeline's steps, in execution order
///
/// The string form keys the checkpoint log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepName {
    FetchPr,
    FetchDiff,
    CreateReview,
    PostStatus,
    FetchThreads,
    BuildPrompt,
    InvokeModel,
    PostReview,
    Finalize,
}

impl StepName {
    pub const ALL: [StepName; 9] = [
        StepName::FetchPr,
        StepName::FetchDiff,
        StepName::CreateReview,
        StepName::PostStatus,
        StepName::FetchThreads,
        StepName::BuildPrompt,
        StepName::InvokeModel,
        StepName::PostReview,
        StepName::Finalize,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StepName::FetchPr => "fetch_pr",
            StepName::FetchDiff => "fetch_diff",
            StepName::CreateReview => "create_review",
            StepName::PostStatus => "post_status",
            StepName::FetchThreads => "fetch_threads",
            StepName::BuildPrompt => "build_prompt",
            StepName::InvokeModel => "invoke_model",
            StepName::PostReview => "post_review",
            StepName::Finalize => "finalize",
        }
    }
}

/// Output of `fetch_pr`: PR metadata plus the resolved merge base
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrSnapshot {
    pub info: PullRequestInfo,
    pub merge_base_sha: String,
}

/// Output of `fetch_diff`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffSnapshot {
    pub diff: String,
    /// Count of added plus removed lines
    pub line_count: u64,
    pub too_large: bool,
}

/// Output of `create_review`: ids the later steps write against
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReviewHandle {
    pub review_id: i64,
    pub repository_id: i64,
}

/// Output of `post_status`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StatusPosted {
    pub comment_id: u64,
}

/// Output of `fetch_threads`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadsSnapshot {
    pub threads: Vec<CommentThread>,
    /// Total review comments on the PR, before thread grouping
    pub comment_count: u64,
}

/// Output of `build_prompt`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptSnapshot {
    pub text: String,
    pub sections: Vec<String>,
    pub overrides_applied: Vec<String>,
    pub patch_id: String,
    pub is_trivial: bool,
}

/// Output of `invoke_model`: the raw, not-yet-validated reply
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSnapshot {
    pub raw: String,
    pub prompt_tokens: Option<i64>,
    pub completion_tokens: Option<i64>,
    pub latency_ms: i64,
    pub model: String,
}

/// Output of `post_review`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewPosted {
    pub github_review_id: u64,
    pub github_comment_id: Option<u64>,
    /// Inline comments accepted by the position check and submitted
    pub posted_comments: u64,
    /// Inline comments dropped because the diff has no such position
    pub skipped_comments: u64,
    pub replies_posted: u64,
}

/// Output of `finalize`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Finalized {
    pub review_id: i64,
    pub comment_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_names_are_unique() {
        let mut names: Vec<&str> = StepName::ALL.iter().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), StepName::ALL.len());
    }

    #[test]
    fn test_step_order() {
        assert_eq!(StepName::ALL[0].as_str(), "fetch_pr");
        assert_eq!(StepName::ALL[8].as_str(), "finalize");
    }
}
