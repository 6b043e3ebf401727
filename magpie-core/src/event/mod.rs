//! Webhook event intake
//!
//! [`classify`] is the pure half and never touches the store.
//! [`EventClassifier`] applies the result: it mirrors installation changes
//! into the store and returns the review requests the pipeline should run.

mod classify;
mod payload;

pub use classify::{
    classify, Classification, InstallationChange, RepoSummary, ReviewRequest, TriggerKind,
    TRIGGER_TOKEN,
};

use magpie_db::Database;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::Result;

/// Applies classified webhook deliveries to the store
pub struct EventClassifier {
    db: Database,
}

impl EventClassifier {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Classify a delivery and apply its side effects
    ///
    /// Returns the review request when the delivery should start a run.
    pub async fn process(&self, event: &str, payload: &Value) -> Result<Option<ReviewRequest>> {
        match classify(event, payload) {
            Classification::Review(request) => {
                self.register(&request).await?;
                info!(
                    owner = %request.owner,
                    repo = %request.repo,
                    pr_number = request.pr_number,
                    trigger = request.trigger.as_str(),
                    "Review requested"
                );
                Ok(Some(request))
            }
            Classification::Installation(change) => {
                self.apply(change).await?;
                Ok(None)
            }
            Classification::Ignored { reason } => {
                debug!(event = %event, reason = %reason, "Ignoring delivery");
                Ok(None)
            }
        }
    }

    /// Ensure the installation and repository behind a request exist
    ///
    /// Manual requests carry no installation id; they rely on the repository
    /// being registered already.
    async fn register(&self, request: &ReviewRequest) -> Result<()> {
        let Some(github_installation_id) = request.installation_id else {
            return Ok(());
        };

        let account_type = request.account_type.as_deref().unwrap_or("User");
        let installation = self
            .db
            .installations()
            .upsert(github_installation_id, &request.owner, account_type)
            .await?;

        self.db
            .repositories()
            .upsert(
                installation.id,
                request.github_repo_id,
                &request.owner,
                &request.repo,
            )
            .await?;

        Ok(())
    }

    async fn apply(&self, change: InstallationChange) -> Result<()> {
        match change {
            InstallationChange::Installed {
                github_installation_id,
                account_login,
                account_type,
                repositories,
            } => {
                let installation = self
                    .db
                    .installations()
                    .upsert(github_installation_id, &account_login, &account_type)
                    .await?;
                for repo in &repositories {
                    self.db
                        .repositories()
                        .upsert(installation.id, repo.github_repo_id, &repo.owner, &repo.name)
                        .await?;
                }
                info!(
                    github_installation_id,
                    account = %account_login,
                    repositories = repositories.len(),
                    "Installation registered"
                );
            }
            InstallationChange::Removed {
                github_installation_id,
            } => {
                let deleted = self
                    .db
                    .installations()
                    .delete_by_github_id(github_installation_id)
                    .await?;
                if deleted {
                    info!(github_installation_id, "Installation removed");
                } else {
                    warn!(github_installation_id, "Removal for unknown installation");
                }
            }
            InstallationChange::RepositoriesChanged {
                github_installation_id,
                account_login,
                account_type,
                added,
                removed,
            } => {
                let installation = self
                    .db
                    .installations()
                    .upsert(github_installation_id, &account_login, &account_type)
                    .await?;
                for repo in &added {
                    self.db
                        .repositories()
                        .upsert(installation.id, repo.github_repo_id, &repo.owner, &repo.name)
                        .await?;
                }
                for repo in &removed {
                    self.db
                        .repositories()
                        .delete_by_github_id(repo.github_repo_id)
                        .await?;
                }
                info!(
                    github_installation_id,
                    added = added.len(),
                    removed = removed.len(),
                    "Installation repositories updated"
                );
            }
        }
        Ok(())
    }
}
