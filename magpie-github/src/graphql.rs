//! GitHub GraphQL API support for features not available in the REST API

use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::{Error, GitHubClient, Result};

/// GraphQL query response wrapper
#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLError>>,
}

/// GraphQL error
#[derive(Debug, Deserialize)]
struct GraphQLError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ThreadLookup {
    repository: Option<RepositoryData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepositoryData {
    pull_request: Option<PullRequestData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PullRequestData {
    review_threads: ThreadConnection,
}

#[derive(Debug, Deserialize)]
struct ThreadConnection {
    nodes: Vec<ThreadNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThreadNode {
    id: String,
    is_resolved: bool,
    comments: CommentConnection,
}

#[derive(Debug, Deserialize)]
struct CommentConnection {
    nodes: Vec<CommentNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentNode {
    database_id: Option<u64>,
}

impl GitHubClient {
    /// Resolve the review thread rooted at a REST comment id
    ///
    /// Thread resolution only exists in the GraphQL API, which names threads
    /// by node id; the REST comment id is mapped through `reviewThreads`
    /// first. Already-resolved threads are left alone.
    pub async fn resolve_thread(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        root_comment_id: u64,
    ) -> Result<()> {
        let Some(thread_id) = self
            .find_thread_id(owner, repo, number, root_comment_id)
            .await?
        else {
            return Err(Error::Graph(format!(
                "No unresolved review thread found for comment {}",
                root_comment_id
            )));
        };

        let mutation = r#"
            mutation($threadId: ID!) {
                resolveReviewThread(input: { threadId: $threadId }) {
                    thread {
                        isResolved
                    }
                }
            }
        "#;
        let variables = json!({ "threadId": thread_id });
        self.graphql::<serde_json::Value>(mutation, &variables)
            .await?;

        debug!(root_comment_id, "Resolved review thread");
        Ok(())
    }

    /// Map a REST review-comment id to its GraphQL thread node id
    async fn find_thread_id(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        root_comment_id: u64,
    ) -> Result<Option<String>> {
        let query = r#"
            query($owner: String!, $repo: String!, $number: Int!) {
                repository(owner: $owner, name: $repo) {
                    pullRequest(number: $number) {
                        reviewThreads(first: 100) {
                            nodes {
                                id
                                isResolved
                                comments(first: 1) {
                                    nodes {
                                        databaseId
                                    }
                                }
                            }
                        }
                    }
                }
            }
        "#;
        let variables = json!({
            "owner": owner,
            "repo": repo,
            "number": number,
        });

        let lookup = self.graphql::<ThreadLookup>(query, &variables).await?;
        let threads = lookup
            .repository
            .and_then(|r| r.pull_request)
            .map(|pr| pr.review_threads.nodes)
            .unwrap_or_default();

        Ok(threads
            .into_iter()
            .filter(|t| !t.is_resolved)
            .find(|t| {
                t.comments.nodes.first().and_then(|c| c.database_id) == Some(root_comment_id)
            })
            .map(|t| t.id))
    }

    /// Execute a GraphQL query
    async fn graphql<T: for<'de> Deserialize<'de>>(
        &self,
        query: &str,
        variables: &serde_json::Value,
    ) -> Result<T> {
        let request_body = json!({
            "query": query,
            "variables": variables,
        });

        let response = self.rest_post("/graphql", &request_body).await?;
        let parsed: GraphQLResponse<T> = response
            .json()
            .await
            .map_err(|e| Error::Parse(format!("Failed to parse GraphQL response: {}", e)))?;

        if let Some(errors) = parsed.errors {
            let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
            return Err(Error::Graph(messages.join(", ")));
        }

        parsed
            .data
            .ok_or_else(|| Error::Graph("GraphQL response missing data".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_lookup_parsing() {
        let json = r#"{
            "repository": {
                "pullRequest": {
                    "reviewThreads": {
                        "nodes": [
                            {
                                "id": "PRRT_kwDOA1",
                                "isResolved": false,
                                "comments": {"nodes": [{"databaseId": 4242}]}
                            },
                            {
                                "id": "PRRT_kwDOA2",
                                "isResolved": true,
                                "comments": {"nodes": [{"databaseId": 4343}]}
                            }
                        ]
                    }
                }
            }
        }"#;
        let lookup: ThreadLookup = serde_json::from_str(json).unwrap();
        let threads = lookup
            .repository
            .unwrap()
            .pull_request
            .unwrap()
            .review_threads
            .nodes;
        assert_eq!(threads.len(), 2);
        assert_eq!(threads[0].id, "PRRT_kwDOA1");
        assert!(!threads[0].is_resolved);
        assert_eq!(threads[0].comments.nodes[0].database_id, Some(4242));
        assert!(threads[1].is_resolved);
    }

    #[test]
    fn test_graphql_error_envelope_parsing() {
        let json = r#"{
            "data": null,
            "errors": [
                {"message": "Resource not accessible", "path": ["repository"]}
            ]
        }"#;
        let parsed: GraphQLResponse<ThreadLookup> = serde_json::from_str(json).unwrap();
        assert!(parsed.data.is_none());
        assert_eq!(parsed.errors.unwrap()[0].message, "Resource not accessible");
    }
}
