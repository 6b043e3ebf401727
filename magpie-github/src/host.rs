//! Host-API binding for the review pipeline
//!
//! Errors cross the crate boundary through the `From` conversion in
//! [`crate::error`], which preserves the transient/fatal split the
//! pipeline's retry loop keys on.

use async_trait::async_trait;

use magpie_core::host::{HostApi, PrComment, PullRequestInfo, ReviewSubmission, SubmittedReview};

use crate::GitHubClient;

#[async_trait]
impl HostApi for GitHubClient {
    async fn get_pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> magpie_core::Result<PullRequestInfo> {
        Ok(self.pull_request_info(owner, repo, number).await?)
    }

    async fn get_merge_base(
        &self,
        owner: &str,
        repo: &str,
        base_ref: &str,
        head_sha: &str,
    ) -> magpie_core::Result<String> {
        Ok(self.merge_base(owner, repo, base_ref, head_sha).await?)
    }

    async fn get_diff(&self, owner: &str, repo: &str, number: u64) -> magpie_core::Result<String> {
        Ok(self.pull_request_diff(owner, repo, number).await?)
    }

    async fn list_review_comments(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> magpie_core::Result<Vec<PrComment>> {
        Ok(self.review_comments(owner, repo, number).await?)
    }

    async fn upsert_marker_comment(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        marker: &str,
        body: &str,
    ) -> magpie_core::Result<u64> {
        Ok(self
            .upsert_issue_comment(owner, repo, number, marker, body)
            .await?)
    }

    async fn submit_review(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        head_sha: &str,
        submission: &ReviewSubmission,
    ) -> magpie_core::Result<SubmittedReview> {
        Ok(self
            .create_review(owner, repo, number, head_sha, submission)
            .await?)
    }
}
