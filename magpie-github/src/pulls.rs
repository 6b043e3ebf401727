//! Pull request metadata and diff access

use serde::Deserialize;
use tracing::debug;

use magpie_core::host::PullRequestInfo;

use crate::{Error, GitHubClient, Result};

/// Compare-endpoint response, reduced to the merge base
#[derive(Debug, Deserialize)]
struct CompareResponse {
    merge_base_commit: CommitRef,
}

#[derive(Debug, Deserialize)]
struct CommitRef {
    sha: String,
}

impl GitHubClient {
    /// Fetch pull request metadata
    pub async fn pull_request_info(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<PullRequestInfo> {
        debug!(owner = %owner, repo = %repo, number, "Fetching pull request");

        let pr = self
            .octocrab()
            .pulls(owner, repo)
            .get(number)
            .await
            .map_err(Error::Api)?;

        Ok(PullRequestInfo {
            number: pr.number,
            title: pr.title.unwrap_or_default(),
            body: pr.body.unwrap_or_default(),
            author: pr.user.map(|u| u.login).unwrap_or_default(),
            draft: pr.draft.unwrap_or(false),
            head_sha: pr.head.sha,
            base_ref: pr.base.ref_field,
            changed_files: pr.changed_files.unwrap_or(0),
            additions: pr.additions.unwrap_or(0),
            deletions: pr.deletions.unwrap_or(0),
        })
    }

    /// Resolve the merge-base commit between a base ref and a head commit
    pub async fn merge_base(
        &self,
        owner: &str,
        repo: &str,
        base_ref: &str,
        head_sha: &str,
    ) -> Result<String> {
        debug!(
            owner = %owner,
            repo = %repo,
            base_ref = %base_ref,
            head_sha = %head_sha,
            "Resolving merge base"
        );

        let path = format!(
            "/repos/{}/{}/compare/{}...{}",
            owner, repo, base_ref, head_sha
        );
        let response = self.rest_get(&path, "application/vnd.github+json").await?;
        let compared: CompareResponse = response
            .json()
            .await
            .map_err(|e| Error::Parse(format!("Failed to parse compare response: {}", e)))?;

        Ok(compared.merge_base_commit.sha)
    }

    /// Fetch the full unified diff for a pull request
    ///
    /// Octocrab has no typed support for the diff media type, so this goes
    /// through the raw REST path with an `Accept` override.
    pub async fn pull_request_diff(&self, owner: &str, repo: &str, number: u64) -> Result<String> {
        debug!(owner = %owner, repo = %repo, number, "Fetching pull request diff");

        let path = format!("/repos/{}/{}/pulls/{}", owner, repo, number);
        let response = self
            .rest_get(&path, "application/vnd.github.v3.diff")
            .await?;
        Ok(response.text().await?)
    }
}
