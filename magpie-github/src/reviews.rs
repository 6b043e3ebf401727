//! Review submission

use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use magpie_core::host::{ReviewSubmission, SubmittedReview};

use crate::{Error, GitHubClient, Result};

#[derive(Debug, Deserialize)]
struct CreatedReview {
    id: u64,
}

impl GitHubClient {
    /// Submit a review with inline comments, then post thread replies
    ///
    /// The review itself must succeed. Replies and thread resolution are
    /// applied afterwards one at a time; a failed reply is logged and
    /// skipped so an almost-complete submission is not redone wholesale.
    pub async fn create_review(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        head_sha: &str,
        submission: &ReviewSubmission,
    ) -> Result<SubmittedReview> {
        debug!(
            owner = %owner,
            repo = %repo,
            number,
            comments = submission.comments.len(),
            "Submitting review"
        );

        let path = format!("/repos/{}/{}/pulls/{}/reviews", owner, repo, number);
        let response = self
            .rest_post(&path, &review_payload(head_sha, submission))
            .await?;
        let created: CreatedReview = response
            .json()
            .await
            .map_err(|e| Error::Parse(format!("Failed to parse review response: {}", e)))?;

        let mut replies_posted = 0u64;
        for reply in &submission.thread_replies {
            match self
                .reply_to_comment(owner, repo, number, reply.comment_id, &reply.body)
                .await
            {
                Ok(_) => {
                    replies_posted += 1;
                    if reply.resolve {
                        if let Err(e) = self
                            .resolve_thread(owner, repo, number, reply.comment_id)
                            .await
                        {
                            warn!(
                                comment_id = reply.comment_id,
                                error = %e,
                                "Could not resolve review thread"
                            );
                        }
                    }
                }
                Err(e) => {
                    warn!(
                        comment_id = reply.comment_id,
                        error = %e,
                        "Could not post thread reply"
                    );
                }
            }
        }

        info!(
            owner = %owner,
            repo = %repo,
            number,
            review_id = created.id,
            replies_posted,
            "Review submitted"
        );

        Ok(SubmittedReview {
            review_id: created.id,
            comment_id: None,
            replies_posted,
        })
    }
}

/// Build the create-review request body
fn review_payload(head_sha: &str, submission: &ReviewSubmission) -> serde_json::Value {
    let comments: Vec<_> = submission
        .comments
        .iter()
        .map(|c| {
            json!({
                "path": c.path,
                "line": c.line,
                "side": c.side,
                "body": c.body,
            })
        })
        .collect();

    json!({
        "commit_id": head_sha,
        "body": submission.body,
        "event": submission.verdict.as_str(),
        "comments": comments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use magpie_core::host::NewInlineComment;
    use magpie_core::review::Verdict;

    #[test]
    fn test_review_payload_shape() {
        let submission = ReviewSubmission {
            body: "Looks solid overall.".to_string(),
            verdict: Verdict::RequestChanges,
            comments: vec![NewInlineComment {
                path: "src/lib.rs".to_string(),
                line: 14,
                body: "Off-by-one here".to_string(),
                side: "RIGHT".to_string(),
            }],
            thread_replies: vec![],
        };

        let payload = review_payload("abc123", &submission);
        assert_eq!(payload["commit_id"], "abc123");
        assert_eq!(payload["event"], "REQUEST_CHANGES");
        assert_eq!(payload["comments"][0]["path"], "src/lib.rs");
        assert_eq!(payload["comments"][0]["line"], 14);
        assert_eq!(payload["comments"][0]["side"], "RIGHT");
    }

    #[test]
    fn test_review_payload_empty_comments() {
        let submission = ReviewSubmission {
            body: "Ship it.".to_string(),
            verdict: Verdict::Approve,
            comments: vec![],
            thread_replies: vec![],
        };

        let payload = review_payload("def456", &submission);
        assert_eq!(payload["event"], "APPROVE");
        assert_eq!(payload["comments"].as_array().unwrap().len(), 0);
    }
}
