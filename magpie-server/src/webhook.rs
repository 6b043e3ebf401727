//! Webhook intake and the run worker
//!
//! Deliveries are classified and enqueued on the request path; execution
//! happens on the worker task so GitHub gets its answer within its delivery
//! timeout regardless of how long a review takes.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use magpie_core::event::EventClassifier;
use magpie_core::model::AnthropicClient;
use magpie_core::pipeline::Pipeline;
use magpie_github::GitHubClient;

/// Shared state behind the webhook routes
pub struct AppState {
    pub classifier: EventClassifier,
    pub pipeline: Arc<Pipeline<GitHubClient, AnthropicClient>>,
    pub tx: mpsc::Sender<String>,
}

/// Build the service router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/webhook", post(handle_webhook))
        .route("/health", get(health))
        .with_state(state)
}

/// Spawn the worker that executes queued runs one at a time
pub fn spawn_worker(
    pipeline: Arc<Pipeline<GitHubClient, AnthropicClient>>,
    mut rx: mpsc::Receiver<String>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(run_id) = rx.recv().await {
            match pipeline.execute(&run_id).await {
                Ok(outcome) => debug!(run_id = %run_id, ?outcome, "Run finished"),
                Err(e) => error!(run_id = %run_id, error = %e, "Run could not be driven"),
            }
        }
        info!("Run queue closed, worker exiting");
    })
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn handle_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let Some(event) = headers.get("x-github-event").and_then(|v| v.to_str().ok()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "missing X-GitHub-Event header" })),
        );
    };

    debug!(event = %event, "Webhook delivery received");

    let request = match state.classifier.process(event, &payload).await {
        Ok(Some(request)) => request,
        Ok(None) => return (StatusCode::OK, Json(json!({ "status": "ignored" }))),
        Err(e) => {
            error!(event = %event, error = %e, "Webhook processing failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            );
        }
    };

    let run = match state.pipeline.enqueue(&request).await {
        Ok(run) => run,
        Err(e) => {
            error!(error = %e, "Could not enqueue run");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            );
        }
    };

    if let Err(e) = state.tx.send(run.id.clone()).await {
        error!(run_id = %run.id, error = %e, "Run queue closed");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "worker unavailable" })),
        );
    }

    info!(run_id = %run.id, event = %event, "Run queued");
    (StatusCode::ACCEPTED, Json(json!({ "run_id": run.id })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use magpie_core::Config;
    use magpie_db::Database;
    use tempfile::TempDir;

    async fn test_state() -> (Arc<AppState>, mpsc::Receiver<String>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::new(&temp_dir.path().join("test.db")).await.unwrap();

        // Dummy credentials: these tests never reach GitHub or the model
        let host = Arc::new(GitHubClient::new("test-token").unwrap());
        let model =
            Arc::new(AnthropicClient::new("test-key", "https://api.anthropic.com", 1024).unwrap());
        let pipeline = Arc::new(Pipeline::new(db.clone(), host, model, Config::default()));

        let (tx, rx) = mpsc::channel(8);
        let state = Arc::new(AppState {
            classifier: EventClassifier::new(db),
            pipeline,
            tx,
        });
        (state, rx, temp_dir)
    }

    fn pr_opened_payload() -> Value {
        json!({
            "action": "opened",
            "pull_request": {
                "number": 7,
                "title": "Add parser",
                "draft": false,
                "user": {"login": "alice", "type": "User"},
                "head": {"ref": "feature/parser", "sha": "abc123"},
                "base": {"ref": "main", "sha": "def456"}
            },
            "repository": {
                "id": 1234,
                "name": "widgets",
                "owner": {"login": "acme", "type": "Organization"}
            },
            "installation": {"id": 99},
            "sender": {"login": "alice", "type": "User"}
        })
    }

    fn event_headers(event: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-github-event", event.parse().unwrap());
        headers
    }

    #[tokio::test]
    async fn test_pull_request_webhook_queues_run() {
        let (state, mut rx, _tmp) = test_state().await;

        let (status, Json(body)) = handle_webhook(
            State(state),
            event_headers("pull_request"),
            Json(pr_opened_payload()),
        )
        .await;

        assert_eq!(status, StatusCode::ACCEPTED);
        let run_id = body["run_id"].as_str().unwrap().to_string();
        assert_eq!(rx.recv().await.unwrap(), run_id);
    }

    #[tokio::test]
    async fn test_ping_is_ignored() {
        let (state, _rx, _tmp) = test_state().await;

        let (status, Json(body)) = handle_webhook(
            State(state),
            event_headers("ping"),
            Json(json!({ "zen": "Keep it simple." })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ignored");
    }

    #[tokio::test]
    async fn test_missing_event_header_is_rejected() {
        let (state, _rx, _tmp) = test_state().await;

        let (status, _) = handle_webhook(State(state), HeaderMap::new(), Json(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_draft_pull_request_not_queued() {
        let (state, mut rx, _tmp) = test_state().await;

        let mut payload = pr_opened_payload();
        payload["pull_request"]["draft"] = json!(true);

        let (status, Json(body)) =
            handle_webhook(State(state), event_headers("pull_request"), Json(payload)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ignored");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_installation_event_registers_without_queuing() {
        let (state, mut rx, _tmp) = test_state().await;

        let payload = json!({
            "action": "created",
            "installation": {
                "id": 99,
                "account": {"login": "acme", "type": "Organization"}
            },
            "repositories": [
                {"id": 1234, "name": "widgets", "full_name": "acme/widgets"}
            ]
        });

        let (status, Json(body)) =
            handle_webhook(State(state), event_headers("installation"), Json(payload)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ignored");
        assert!(rx.try_recv().is_err());
    }
}
