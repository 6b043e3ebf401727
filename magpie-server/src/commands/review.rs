//! Review command - drive one pull request through the pipeline now

use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Args;

use magpie_core::event::{ReviewRequest, TriggerKind};
use magpie_core::pipeline::{Pipeline, RunOutcome};
use magpie_core::Config;
use magpie_db::Database;
use magpie_github::GitHubClient;

use super::serve;

/// Arguments for the review command
#[derive(Args, Debug)]
pub struct ReviewArgs {
    /// Repository in owner/name form
    #[arg(required = true)]
    pub repository: String,

    /// Pull request number
    #[arg(required = true)]
    pub number: u64,
}

impl ReviewArgs {
    /// Execute the review command
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let Some((owner, repo)) = self.repository.split_once('/') else {
            bail!(
                "Invalid repository format: {}. Expected owner/repo",
                self.repository
            );
        };

        let db_path = config.database.resolve_path()?;
        let db = Database::new(&db_path).await?;

        let repository = db
            .repositories()
            .find_by_full_name(owner, repo)
            .await?
            .with_context(|| {
                format!(
                    "Repository {}/{} is not registered; install the app on it first",
                    owner, repo
                )
            })?;

        let host = Arc::new(GitHubClient::from_secrets()?);
        let model = Arc::new(serve::model_client(config)?);
        let pipeline = Pipeline::new(db, host, model, config.clone());

        let request = ReviewRequest {
            installation_id: None,
            github_repo_id: repository.github_repo_id,
            owner: owner.to_string(),
            repo: repo.to_string(),
            pr_number: self.number,
            head_sha: None,
            base_ref: None,
            trigger: TriggerKind::Manual,
            requested_by: None,
            account_type: None,
        };

        println!("Reviewing {}/{}#{} ...", owner, repo, self.number);
        let (run, outcome) = pipeline.run_request(&request).await?;

        match outcome {
            RunOutcome::Completed { review_id } => {
                println!("Review completed (run {}, review {})", run.id, review_id);
            }
            RunOutcome::Skipped { reason } => {
                println!("Review skipped: {} (run {})", reason.as_str(), run.id);
            }
            RunOutcome::Failed { message } => {
                bail!("Review failed: {} (run {})", message, run.id);
            }
        }

        Ok(())
    }
}
