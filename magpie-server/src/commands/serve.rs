//! Serve command - webhook listener plus review worker

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{error, info};

use magpie_core::event::EventClassifier;
use magpie_core::model::AnthropicClient;
use magpie_core::pipeline::Pipeline;
use magpie_core::{Config, Secrets};
use magpie_db::Database;
use magpie_github::GitHubClient;

use crate::webhook::{self, AppState};

/// Runs waiting on the worker before webhook deliveries start backing up
const QUEUE_DEPTH: usize = 64;

/// Run the service until the process is stopped
pub async fn run(config: Config) -> anyhow::Result<()> {
    let db_path = config.database.resolve_path()?;
    let db = Database::new(&db_path)
        .await
        .with_context(|| format!("opening database at {}", db_path.display()))?;

    let host = Arc::new(GitHubClient::from_secrets()?);
    let model = Arc::new(model_client(&config)?);
    let pipeline = Arc::new(Pipeline::new(db.clone(), host, model, config.clone()));

    // Re-drive runs the previous process left queued or running
    let resume = pipeline.clone();
    tokio::spawn(async move {
        match resume.resume_incomplete().await {
            Ok(outcomes) if outcomes.is_empty() => {}
            Ok(outcomes) => info!(count = outcomes.len(), "Resumed interrupted runs"),
            Err(e) => error!(error = %e, "Could not resume interrupted runs"),
        }
    });

    let (tx, rx) = mpsc::channel(QUEUE_DEPTH);
    webhook::spawn_worker(pipeline.clone(), rx);

    let state = Arc::new(AppState {
        classifier: EventClassifier::new(db),
        pipeline,
        tx,
    });
    let app = webhook::router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.server.bind_addr))?;
    info!(addr = %config.server.bind_addr, "Webhook listener started");
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the Anthropic client from config and secrets
pub(crate) fn model_client(config: &Config) -> anyhow::Result<AnthropicClient> {
    let secrets = Secrets::load()?;
    let api_key = secrets.anthropic_api_key().context(
        "Anthropic API key not found. Set ANTHROPIC_API_KEY environment variable \
         or add it to ~/.config/magpie/secrets.toml",
    )?;
    Ok(AnthropicClient::new(
        api_key,
        config.model.base_url.clone(),
        config.model.max_tokens,
    )?)
}
