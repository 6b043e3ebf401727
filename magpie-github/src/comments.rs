//! Review comment listing, thread replies, and the marker comment

use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use magpie_core::host::PrComment;

use crate::{Error, GitHubClient, Result};

#[derive(Debug, Deserialize)]
struct CreatedComment {
    id: u64,
}

impl GitHubClient {
    /// List all review comments on a pull request
    pub async fn review_comments(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<PrComment>> {
        debug!(owner = %owner, repo = %repo, number, "Listing review comments");

        let comments = self
            .octocrab()
            .pulls(owner, repo)
            .list_comments(Some(number))
            .per_page(100)
            .send()
            .await
            .map_err(Error::Api)?;

        Ok(comments
            .items
            .into_iter()
            .map(|c| PrComment {
                id: c.id.0,
                parent_id: c.in_reply_to_id.map(|id| id.0),
                author: c.user.map(|u| u.login).unwrap_or_default(),
                body: c.body,
                path: Some(c.path),
                line: c.line,
                created_at: c.created_at,
            })
            .collect())
    }

    /// Reply on the thread rooted at an existing review comment
    pub async fn reply_to_comment(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        comment_id: u64,
        body: &str,
    ) -> Result<u64> {
        debug!(owner = %owner, repo = %repo, number, comment_id, "Replying to review comment");

        let path = format!(
            "/repos/{}/{}/pulls/{}/comments/{}/replies",
            owner, repo, number, comment_id
        );
        let response = self.rest_post(&path, &json!({ "body": body })).await?;
        let created: CreatedComment = response
            .json()
            .await
            .map_err(|e| Error::Parse(format!("Failed to parse reply response: {}", e)))?;

        Ok(created.id)
    }

    /// Create or replace the single issue comment tagged with `marker`
    ///
    /// Scans the PR's issue comments for one containing the marker and
    /// updates it in place; only when none exists is a comment created, so
    /// repeated calls never stack up status comments.
    pub async fn upsert_issue_comment(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        marker: &str,
        body: &str,
    ) -> Result<u64> {
        let issues = self.octocrab().issues(owner, repo);

        let existing = issues
            .list_comments(number)
            .per_page(100)
            .send()
            .await
            .map_err(Error::Api)?;

        if let Some(comment) = existing
            .items
            .iter()
            .find(|c| c.body.as_deref().is_some_and(|b| b.contains(marker)))
        {
            debug!(comment_id = comment.id.0, "Updating marker comment");
            issues
                .update_comment(comment.id, body)
                .await
                .map_err(Error::Api)?;
            return Ok(comment.id.0);
        }

        let created = issues
            .create_comment(number, body)
            .await
            .map_err(Error::Api)?;
        debug!(comment_id = created.id.0, "Created marker comment");
        Ok(created.id.0)
    }
}
