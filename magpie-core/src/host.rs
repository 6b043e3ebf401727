//! Hosting-platform interface consumed by the pipeline
//!
//! The pipeline talks to the source host exclusively through [`HostApi`], so
//! the engine can be driven by the GitHub client in production and by
//! in-memory fakes in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::review::Verdict;
use crate::Result;

/// Pull request metadata as fetched from the hosting platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestInfo {
    pub number: u64,
    pub title: String,
    pub body: String,
    pub author: String,
    pub draft: bool,
    pub head_sha: String,
    pub base_ref: String,
    pub changed_files: u64,
    pub additions: u64,
    pub deletions: u64,
}

/// A single review comment on a pull request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrComment {
    pub id: u64,
    /// Comment this one replies to; `None` for thread roots
    pub parent_id: Option<u64>,
    pub author: String,
    pub body: String,
    pub path: Option<String>,
    pub line: Option<u64>,
    pub created_at: DateTime<Utc>,
}

/// Inline comment attached to a submitted review
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewInlineComment {
    pub path: String,
    pub line: u64,
    pub body: String,
    pub side: String,
}

/// Reply to post on an existing comment thread
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadReply {
    /// Root comment of the thread being answered
    pub comment_id: u64,
    pub body: String,
    /// Resolve the thread after replying
    pub resolve: bool,
}

/// A complete review ready for submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewSubmission {
    pub body: String,
    pub verdict: Verdict,
    pub comments: Vec<NewInlineComment>,
    pub thread_replies: Vec<ThreadReply>,
}

/// Identifiers assigned by the hosting platform for a submitted review
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmittedReview {
    pub review_id: u64,
    pub comment_id: Option<u64>,
    /// Replies that were actually created on existing threads
    pub replies_posted: u64,
}

/// Source-hosting operations the pipeline depends on
#[async_trait]
pub trait HostApi: Send + Sync {
    /// Fetch pull request metadata
    async fn get_pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<PullRequestInfo>;

    /// Resolve the merge-base commit between a base ref and a head commit
    async fn get_merge_base(
        &self,
        owner: &str,
        repo: &str,
        base_ref: &str,
        head_sha: &str,
    ) -> Result<String>;

    /// Fetch the full unified diff for a pull request
    async fn get_diff(&self, owner: &str, repo: &str, number: u64) -> Result<String>;

    /// List all review comments currently on a pull request
    async fn list_review_comments(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<PrComment>>;

    /// Create or replace the single comment tagged with `marker`
    ///
    /// Returns the comment id. Calling this repeatedly with the same marker
    /// must never produce a second marker comment on the PR.
    async fn upsert_marker_comment(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        marker: &str,
        body: &str,
    ) -> Result<u64>;

    /// Submit a review with its inline comments and thread replies
    async fn submit_review(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        head_sha: &str,
        submission: &ReviewSubmission,
    ) -> Result<SubmittedReview>;
}
