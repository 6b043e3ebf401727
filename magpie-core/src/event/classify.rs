//! Pure classification of incoming webhook events
//!
//! Classification never fails: anything unparseable or out of scope becomes
//! [`Classification::Ignored`] with a reason, so one malformed delivery can
//! never take the webhook endpoint down.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::payload::{
    InstallationEvent, InstallationRepositoriesEvent, IssueCommentEvent, PullRequestEvent,
    RepoRef,
};
use crate::threads::is_bot;

/// Comment text that requests a review
pub const TRIGGER_TOKEN: &str = "@magpie review";

/// What caused a review to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    Push,
    Comment,
    Manual,
}

impl TriggerKind {
    pub fn as_str(&self) -> &str {
        match self {
            TriggerKind::Push => "push",
            TriggerKind::Comment => "comment",
            TriggerKind::Manual => "manual",
        }
    }
}

/// A review the pipeline should run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRequest {
    /// GitHub installation id, absent for manual runs
    pub installation_id: Option<i64>,
    pub github_repo_id: i64,
    pub owner: String,
    pub repo: String,
    pub pr_number: u64,
    /// Known for push triggers; comment triggers fetch it later
    pub head_sha: Option<String>,
    pub base_ref: Option<String>,
    pub trigger: TriggerKind,
    pub requested_by: Option<String>,
    /// Account type of the repository owner, `User` or `Organization`
    pub account_type: Option<String>,
}

/// Repository named in an installation event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSummary {
    pub github_repo_id: i64,
    pub owner: String,
    pub name: String,
}

impl RepoSummary {
    fn from_ref(repo: &RepoRef, fallback_owner: &str) -> Self {
        let owner = repo
            .full_name
            .split_once('/')
            .map_or(fallback_owner, |(owner, _)| owner);
        Self {
            github_repo_id: repo.id,
            owner: owner.to_string(),
            name: repo.name.clone(),
        }
    }
}

/// Installation lifecycle change to mirror into the store
#[derive(Debug, Clone)]
pub enum InstallationChange {
    Installed {
        github_installation_id: i64,
        account_login: String,
        account_type: String,
        repositories: Vec<RepoSummary>,
    },
    Removed {
        github_installation_id: i64,
    },
    RepositoriesChanged {
        github_installation_id: i64,
        account_login: String,
        account_type: String,
        added: Vec<RepoSummary>,
        removed: Vec<RepoSummary>,
    },
}

/// Outcome of classifying one delivery
#[derive(Debug)]
pub enum Classification {
    Review(ReviewRequest),
    Installation(InstallationChange),
    Ignored { reason: String },
}

impl Classification {
    fn ignored(reason: impl Into<String>) -> Self {
        Classification::Ignored {
            reason: reason.into(),
        }
    }
}

/// Classify one webhook delivery by event name and payload
pub fn classify(event: &str, payload: &Value) -> Classification {
    match event {
        "pull_request" => classify_pull_request(payload),
        "issue_comment" => classify_issue_comment(payload),
        "installation" => classify_installation(payload),
        "installation_repositories" => classify_installation_repositories(payload),
        "ping" => Classification::ignored("ping"),
        other => Classification::ignored(format!("unhandled event {}", other)),
    }
}

fn parse<T: serde::de::DeserializeOwned>(payload: &Value) -> Option<T> {
    serde_json::from_value(payload.clone()).ok()
}

fn classify_pull_request(payload: &Value) -> Classification {
    let Some(event) = parse::<PullRequestEvent>(payload) else {
        return Classification::ignored("malformed pull_request payload");
    };

    match event.action.as_str() {
        "opened" | "synchronize" | "ready_for_review" => {}
        other => {
            return Classification::ignored(format!("unhandled pull_request action {}", other))
        }
    }

    if event.pull_request.draft {
        return Classification::ignored("draft pull request");
    }

    let pr = &event.pull_request;
    Classification::Review(ReviewRequest {
        installation_id: event.installation.as_ref().map(|i| i.id),
        github_repo_id: event.repository.id,
        owner: event.repository.owner.login.clone(),
        repo: event.repository.name.clone(),
        pr_number: pr.number,
        head_sha: Some(pr.head.sha.clone()),
        base_ref: Some(pr.base.ref_field.clone()),
        trigger: TriggerKind::Push,
        requested_by: event.sender.as_ref().map(|s| s.login.clone()),
        account_type: event.repository.owner.kind.clone(),
    })
}

fn classify_issue_comment(payload: &Value) -> Classification {
    let Some(event) = parse::<IssueCommentEvent>(payload) else {
        return Classification::ignored("malformed issue_comment payload");
    };

    if event.action != "created" {
        return Classification::ignored(format!(
            "unhandled issue_comment action {}",
            event.action
        ));
    }
    if event.issue.pull_request.is_none() {
        return Classification::ignored("comment on a plain issue");
    }
    if !event.comment.body.contains(TRIGGER_TOKEN) {
        return Classification::ignored("comment without trigger token");
    }
    // A bot echoing the trigger text must not start a loop
    if is_bot(&event.comment.user.login) {
        return Classification::ignored("trigger comment from a bot");
    }

    Classification::Review(ReviewRequest {
        installation_id: event.installation.as_ref().map(|i| i.id),
        github_repo_id: event.repository.id,
        owner: event.repository.owner.login.clone(),
        repo: event.repository.name.clone(),
        pr_number: event.issue.number,
        head_sha: None,
        base_ref: None,
        trigger: TriggerKind::Comment,
        requested_by: Some(event.comment.user.login.clone()),
        account_type: event.repository.owner.kind.clone(),
    })
}

fn classify_installation(payload: &Value) -> Classification {
    let Some(event) = parse::<InstallationEvent>(payload) else {
        return Classification::ignored("malformed installation payload");
    };

    let account_login = event.installation.account.login.clone();
    match event.action.as_str() {
        "created" => Classification::Installation(InstallationChange::Installed {
            github_installation_id: event.installation.id,
            account_type: account_type_of(&event.installation.account.kind),
            repositories: event
                .repositories
                .iter()
                .map(|r| RepoSummary::from_ref(r, &account_login))
                .collect(),
            account_login,
        }),
        "deleted" => Classification::Installation(InstallationChange::Removed {
            github_installation_id: event.installation.id,
        }),
        other => Classification::ignored(format!("unhandled installation action {}", other)),
    }
}

fn classify_installation_repositories(payload: &Value) -> Classification {
    let Some(event) = parse::<InstallationRepositoriesEvent>(payload) else {
        return Classification::ignored("malformed installation_repositories payload");
    };

    let account_login = event.installation.account.login.clone();
    Classification::Installation(InstallationChange::RepositoriesChanged {
        github_installation_id: event.installation.id,
        account_type: account_type_of(&event.installation.account.kind),
        added: event
            .repositories_added
            .iter()
            .map(|r| RepoSummary::from_ref(r, &account_login))
            .collect(),
        removed: event
            .repositories_removed
            .iter()
            .map(|r| RepoSummary::from_ref(r, &account_login))
            .collect(),
        account_login,
    })
}

fn account_type_of(kind: &Option<String>) -> String {
    kind.clone().unwrap_or_else(|| "User".to_string())
}
