//! The review pipeline engine
//!
//! A run walks nine steps from webhook to posted review. Every step's output
//! is checkpointed before the next starts, so a process crash loses at most
//! the step in flight; `resume_incomplete` replays finished steps from the
//! log and redoes only the rest. Transient step failures retry on a bounded
//! budget, fatal ones end the run through the failure handler, which also
//! moves any review record out of its non-terminal state.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use magpie_db::{
    Database, NewPipelineRun, NewReview, NewReviewComment, PipelineRun, ReviewCompletion,
};

use super::locks::PrLocks;
use super::steps::{
    DiffSnapshot, Finalized, ModelSnapshot, PrSnapshot, PromptSnapshot, ReviewHandle,
    ReviewPosted, StatusPosted, StepName, ThreadsSnapshot,
};
use crate::diff::DiffIndex;
use crate::event::ReviewRequest;
use crate::host::{HostApi, NewInlineComment, ReviewSubmission, ThreadReply};
use crate::model::ReviewModel;
use crate::prompt::{self, PromptFlags};
use crate::review::{InlineComment, ReviewOutput, Verdict};
use crate::threads::{build_threads, CommentThread};
use crate::{Config, Error, Result};

/// Marker identifying the pipeline's status comment on a pull request
pub const STATUS_MARKER: &str = "<!-- magpie:status -->";

/// Why a run ended without producing a review
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Draft,
    TooLarge,
}

impl SkipReason {
    pub fn as_str(&self) -> &str {
        match self {
            SkipReason::Draft => "draft",
            SkipReason::TooLarge => "too_large",
        }
    }
}

/// Terminal outcome of one pipeline execution
#[derive(Debug)]
pub enum RunOutcome {
    Completed { review_id: i64 },
    Skipped { reason: SkipReason },
    Failed { message: String },
}

/// Drives review requests through the step sequence
pub struct Pipeline<H: HostApi, M: ReviewModel> {
    db: Database,
    host: Arc<H>,
    model: Arc<M>,
    config: Config,
    locks: PrLocks,
}

impl<H: HostApi, M: ReviewModel> Pipeline<H, M> {
    pub fn new(db: Database, host: Arc<H>, model: Arc<M>, config: Config) -> Self {
        Self {
            db,
            host,
            model,
            config,
            locks: PrLocks::new(),
        }
    }

    /// Record a new run for a review request
    pub async fn enqueue(&self, request: &ReviewRequest) -> Result<PipelineRun> {
        let run = self
            .db
            .pipeline_runs()
            .create(NewPipelineRun {
                id: Uuid::new_v4().to_string(),
                installation_id: request.installation_id.unwrap_or(0),
                owner: request.owner.clone(),
                repo: request.repo.clone(),
                pr_number: request.pr_number as i64,
                head_sha: request.head_sha.clone(),
                base_ref: request.base_ref.clone(),
                trigger_kind: request.trigger.as_str().to_string(),
                requested_by: request.requested_by.clone(),
            })
            .await?;

        info!(
            run_id = %run.id,
            owner = %run.owner,
            repo = %run.repo,
            pr_number = run.pr_number,
            trigger = %run.trigger_kind,
            "Queued pipeline run"
        );
        Ok(run)
    }

    /// Enqueue a request and execute it to a terminal status
    pub async fn run_request(&self, request: &ReviewRequest) -> Result<(PipelineRun, RunOutcome)> {
        let run = self.enqueue(request).await?;
        let outcome = self.execute(&run.id).await?;
        Ok((run, outcome))
    }

    /// Execute one run to a terminal status
    ///
    /// Failures inside the step sequence are absorbed by the failure handler
    /// and reported as [`RunOutcome::Failed`]; an `Err` from this method means
    /// the run could not be driven at all.
    pub async fn execute(&self, run_id: &str) -> Result<RunOutcome> {
        let run = self.db.pipeline_runs().get(run_id).await?;
        if run.is_terminal() {
            return Err(Error::Precondition(format!(
                "run {} is already {}",
                run.id, run.status
            )));
        }

        let key = format!("{}/{}#{}", run.owner, run.repo, run.pr_number);
        let _guard = self.locks.acquire(&key).await;

        self.db.pipeline_runs().mark_running(&run.id).await?;
        info!(run_id = %run.id, pr = %key, "Pipeline run started");

        match self.drive(&run).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => Ok(self.handle_failure(&run, &e).await),
        }
    }

    /// Pick up runs left queued or running by an earlier process
    pub async fn resume_incomplete(&self) -> Result<Vec<RunOutcome>> {
        let runs = self.db.pipeline_runs().find_incomplete().await?;
        if runs.is_empty() {
            return Ok(Vec::new());
        }
        info!(count = runs.len(), "Resuming incomplete pipeline runs");

        let mut outcomes = Vec::with_capacity(runs.len());
        for run in runs {
            outcomes.push(self.execute(&run.id).await?);
        }
        Ok(outcomes)
    }

    async fn drive(&self, run: &PipelineRun) -> Result<RunOutcome> {
        let pr: PrSnapshot = self.step(run, StepName::FetchPr, || self.fetch_pr(run)).await?;

        if pr.info.draft {
            info!(run_id = %run.id, "Pull request is a draft, skipping");
            self.db
                .pipeline_runs()
                .mark_skipped(&run.id, SkipReason::Draft.as_str())
                .await?;
            return Ok(RunOutcome::Skipped {
                reason: SkipReason::Draft,
            });
        }

        let diff: DiffSnapshot = self
            .step(run, StepName::FetchDiff, || self.fetch_diff(run))
            .await?;

        if diff.too_large {
            info!(
                run_id = %run.id,
                line_count = diff.line_count,
                limit = self.config.review.max_diff_lines,
                "Diff exceeds the review limit, skipping"
            );
            let body = too_large_body(diff.line_count, self.config.review.max_diff_lines);
            // The explanation comment is best effort; the skip is not
            if let Err(e) = self
                .host
                .upsert_marker_comment(
                    &run.owner,
                    &run.repo,
                    run.pr_number as u64,
                    STATUS_MARKER,
                    &body,
                )
                .await
            {
                warn!(run_id = %run.id, error = %e, "Could not post skip explanation");
            }
            self.db
                .pipeline_runs()
                .mark_skipped(&run.id, SkipReason::TooLarge.as_str())
                .await?;
            return Ok(RunOutcome::Skipped {
                reason: SkipReason::TooLarge,
            });
        }

        let handle: ReviewHandle = self
            .step(run, StepName::CreateReview, || self.create_review(run, &pr))
            .await?;

        let _status: StatusPosted = self
            .step(run, StepName::PostStatus, || self.post_status(run, &pr))
            .await?;

        let threads: ThreadsSnapshot = self
            .step(run, StepName::FetchThreads, || self.fetch_threads(run))
            .await?;

        let prompt: PromptSnapshot = self
            .step(run, StepName::BuildPrompt, || {
                self.build_prompt(run, &pr, &diff, &threads, &handle)
            })
            .await?;

        let reply: ModelSnapshot = self
            .step(run, StepName::InvokeModel, || self.invoke_model(&prompt))
            .await?;

        let posted: ReviewPosted = self
            .step(run, StepName::PostReview, || {
                self.post_review(run, &pr, &diff, &threads, &reply)
            })
            .await?;

        let done: Finalized = self
            .step(run, StepName::Finalize, || {
                self.finalize(run, &pr, &diff, &handle, &reply, &posted)
            })
            .await?;

        self.db.pipeline_runs().mark_completed(&run.id).await?;
        info!(
            run_id = %run.id,
            review_id = done.review_id,
            comments = done.comment_count,
            "Pipeline run completed"
        );
        Ok(RunOutcome::Completed {
            review_id: done.review_id,
        })
    }

    /// Run one step with checkpoint replay and a bounded retry budget
    async fn step<T, F, Fut>(&self, run: &PipelineRun, name: StepName, op: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let runs = self.db.pipeline_runs();

        if let Some(record) = runs.find_step(&run.id, name.as_str()).await? {
            debug!(run_id = %run.id, step = name.as_str(), "Replaying checkpointed step");
            return serde_json::from_str(&record.output_json).map_err(Error::from);
        }

        let mut attempt: u32 = 0;
        let output = loop {
            attempt += 1;
            match op().await {
                Ok(output) => break output,
                Err(e) if e.is_transient() && attempt <= self.config.review.max_step_retries => {
                    warn!(
                        run_id = %run.id,
                        step = name.as_str(),
                        attempt,
                        error = %e,
                        "Step failed, retrying"
                    );
                    sleep(self.config.review.retry_delay).await;
                }
                Err(e) => {
                    error!(
                        run_id = %run.id,
                        step = name.as_str(),
                        attempt,
                        error = %e,
                        "Step failed"
                    );
                    return Err(e);
                }
            }
        };

        let json = serde_json::to_string(&output)?;
        runs.record_step(&run.id, name.as_str(), &json, i64::from(attempt))
            .await?;
        debug!(run_id = %run.id, step = name.as_str(), attempt, "Step completed");
        Ok(output)
    }

    async fn fetch_pr(&self, run: &PipelineRun) -> Result<PrSnapshot> {
        let info = self
            .host
            .get_pull_request(&run.owner, &run.repo, run.pr_number as u64)
            .await?;
        let merge_base_sha = self
            .host
            .get_merge_base(&run.owner, &run.repo, &info.base_ref, &info.head_sha)
            .await?;
        Ok(PrSnapshot {
            info,
            merge_base_sha,
        })
    }

    async fn fetch_diff(&self, run: &PipelineRun) -> Result<DiffSnapshot> {
        let diff = self
            .host
            .get_diff(&run.owner, &run.repo, run.pr_number as u64)
            .await?;
        let line_count = DiffIndex::parse(&diff).changed_line_count();
        let too_large = line_count > self.config.review.max_diff_lines as u64;
        Ok(DiffSnapshot {
            diff,
            line_count,
            too_large,
        })
    }

    async fn create_review(&self, run: &PipelineRun, pr: &PrSnapshot) -> Result<ReviewHandle> {
        let repository = self
            .db
            .repositories()
            .find_by_full_name(&run.owner, &run.repo)
            .await?
            .ok_or_else(|| {
                Error::Precondition(format!(
                    "repository {}/{} is not registered",
                    run.owner, run.repo
                ))
            })?;

        let review = self
            .db
            .reviews()
            .create(NewReview {
                repository_id: repository.id,
                pr_number: run.pr_number,
                head_sha: pr.info.head_sha.clone(),
                base_ref: pr.info.base_ref.clone(),
                trigger_kind: run.trigger_kind.clone(),
                model: Some(self.config.model.name.clone()),
            })
            .await?;

        let marked = self
            .db
            .reviews()
            .mark_in_progress(review.id, &pr.merge_base_sha)
            .await?;
        if !marked {
            warn!(review_id = review.id, "Review did not move to in_progress");
        }

        Ok(ReviewHandle {
            review_id: review.id,
            repository_id: repository.id,
        })
    }

    async fn post_status(&self, run: &PipelineRun, pr: &PrSnapshot) -> Result<StatusPosted> {
        let trigger = match run.requested_by.as_deref() {
            Some(user) => format!("requested by @{}", user),
            None => format!("trigger: {}", run.trigger_kind),
        };
        let body = format!(
            "{}\n:bird: Magpie is reviewing commit `{}` ({} files, +{} / -{}), {}.",
            STATUS_MARKER,
            short_sha(&pr.info.head_sha),
            pr.info.changed_files,
            pr.info.additions,
            pr.info.deletions,
            trigger
        );
        let comment_id = self
            .host
            .upsert_marker_comment(
                &run.owner,
                &run.repo,
                run.pr_number as u64,
                STATUS_MARKER,
                &body,
            )
            .await?;
        Ok(StatusPosted { comment_id })
    }

    async fn fetch_threads(&self, run: &PipelineRun) -> Result<ThreadsSnapshot> {
        let comments = self
            .host
            .list_review_comments(&run.owner, &run.repo, run.pr_number as u64)
            .await?;
        let comment_count = comments.len() as u64;
        let threads = build_threads(&comments);
        Ok(ThreadsSnapshot {
            threads,
            comment_count,
        })
    }

    async fn build_prompt(
        &self,
        run: &PipelineRun,
        pr: &PrSnapshot,
        diff: &DiffSnapshot,
        threads: &ThreadsSnapshot,
        handle: &ReviewHandle,
    ) -> Result<PromptSnapshot> {
        let overrides: HashMap<String, String> = self
            .db
            .prompt_overrides()
            .list_for_repository(handle.repository_id)
            .await?
            .into_iter()
            .map(|o| (o.section_key, o.content))
            .collect();

        let is_trivial =
            pr.info.additions + pr.info.deletions < self.config.review.trivial_change_lines;
        let patch_id = patch_id_for(&pr.info.head_sha);

        let flags = PromptFlags {
            has_existing_comments: threads.comment_count > 0,
            is_trivial,
        };

        let vars = prompt_vars(run, pr, diff, threads, &patch_id);
        let assembled = prompt::assemble(&vars, &overrides, &flags);

        let marked = self
            .db
            .reviews()
            .set_patch_id(handle.review_id, &patch_id)
            .await?;
        if !marked {
            warn!(review_id = handle.review_id, "Could not record patch id");
        }

        debug!(
            run_id = %run.id,
            sections = assembled.sections.len(),
            overrides = assembled.overrides_applied.len(),
            prompt_bytes = assembled.text.len(),
            "Assembled review prompt"
        );

        Ok(PromptSnapshot {
            text: assembled.text,
            sections: assembled.sections,
            overrides_applied: assembled.overrides_applied,
            patch_id,
            is_trivial,
        })
    }

    async fn invoke_model(&self, prompt: &PromptSnapshot) -> Result<ModelSnapshot> {
        let model = self.config.model.name.clone();
        let response = self.model.submit(&prompt.text, &model).await?;
        Ok(ModelSnapshot {
            raw: response.raw,
            prompt_tokens: response.prompt_tokens,
            completion_tokens: response.completion_tokens,
            latency_ms: response.latency_ms,
            model,
        })
    }

    async fn post_review(
        &self,
        run: &PipelineRun,
        pr: &PrSnapshot,
        diff: &DiffSnapshot,
        threads: &ThreadsSnapshot,
        reply: &ModelSnapshot,
    ) -> Result<ReviewPosted> {
        let output = ReviewOutput::validate(&reply.raw)?;
        let index = DiffIndex::parse(&diff.diff);
        let (accepted, rejected) = partition_comments(&output, &index);

        let comments = accepted
            .iter()
            .map(|c| NewInlineComment {
                path: c.path.clone(),
                line: c.line as u64,
                body: render_comment_body(c),
                side: c.side().as_str().to_string(),
            })
            .collect();

        let submission = ReviewSubmission {
            body: output.body.clone(),
            verdict: output.verdict,
            comments,
            thread_replies: thread_replies_for(&output, &threads.threads),
        };

        let submitted = self
            .host
            .submit_review(
                &run.owner,
                &run.repo,
                run.pr_number as u64,
                &pr.info.head_sha,
                &submission,
            )
            .await?;

        if !rejected.is_empty() {
            warn!(
                run_id = %run.id,
                skipped = rejected.len(),
                "Dropped inline comments without a diff position"
            );
        }
        info!(
            run_id = %run.id,
            verdict = output.verdict.as_str(),
            posted = accepted.len(),
            replies = submitted.replies_posted,
            "Review submitted"
        );

        Ok(ReviewPosted {
            github_review_id: submitted.review_id,
            github_comment_id: submitted.comment_id,
            posted_comments: accepted.len() as u64,
            skipped_comments: rejected.len() as u64,
            replies_posted: submitted.replies_posted,
        })
    }

    /// Persist the validated outcome and close out the review record
    ///
    /// The partition from `post_review` is re-derived here from the
    /// checkpointed diff and raw reply rather than carried across steps;
    /// both inputs are durable, so the result is identical on replay.
    async fn finalize(
        &self,
        run: &PipelineRun,
        pr: &PrSnapshot,
        diff: &DiffSnapshot,
        handle: &ReviewHandle,
        reply: &ModelSnapshot,
        posted: &ReviewPosted,
    ) -> Result<Finalized> {
        let output = ReviewOutput::validate(&reply.raw)?;
        let index = DiffIndex::parse(&diff.diff);
        let (accepted, rejected) = partition_comments(&output, &index);

        let mut rows = Vec::with_capacity(output.comments.len());
        for (comment, posted_flag) in accepted
            .iter()
            .map(|c| (*c, true))
            .chain(rejected.iter().map(|c| (*c, false)))
        {
            rows.push(NewReviewComment {
                review_id: handle.review_id,
                path: comment.path.clone(),
                line: comment.line,
                body: comment.body.clone(),
                suggestion: comment.suggestion.clone(),
                side: comment.side().as_str().to_string(),
                posted: posted_flag,
                github_comment_id: None,
            });
        }

        // A retried finalize must not double-insert
        if self
            .db
            .review_comments()
            .count_for_review(handle.review_id)
            .await?
            == 0
        {
            self.db.review_comments().insert_many(&rows).await?;
        }

        let completed = self
            .db
            .reviews()
            .complete(
                handle.review_id,
                ReviewCompletion {
                    verdict: output.verdict.as_str().to_string(),
                    confidence: output.confidence,
                    body: output.body.clone(),
                    comment_count: accepted.len() as i64,
                    raw_output: reply.raw.clone(),
                    prompt_tokens: reply.prompt_tokens,
                    completion_tokens: reply.completion_tokens,
                    latency_ms: Some(reply.latency_ms),
                    github_review_id: Some(posted.github_review_id as i64),
                    github_comment_id: posted.github_comment_id.map(|id| id as i64),
                },
            )
            .await?;
        if !completed {
            warn!(
                review_id = handle.review_id,
                "Review was already terminal during finalize"
            );
        }

        let body = format!(
            "{}\n:bird: Magpie reviewed commit `{}` and {}.",
            STATUS_MARKER,
            short_sha(&pr.info.head_sha),
            verdict_phrase(output.verdict)
        );
        if let Err(e) = self
            .host
            .upsert_marker_comment(
                &run.owner,
                &run.repo,
                run.pr_number as u64,
                STATUS_MARKER,
                &body,
            )
            .await
        {
            warn!(run_id = %run.id, error = %e, "Could not update status comment");
        }

        Ok(Finalized {
            review_id: handle.review_id,
            comment_count: accepted.len() as i64,
        })
    }

    /// Mark the run and any non-terminal review failed; never raises
    async fn handle_failure(&self, run: &PipelineRun, cause: &Error) -> RunOutcome {
        let message = cause.to_string();
        error!(run_id = %run.id, error = %message, "Pipeline run failed");

        match self.find_active_review(run).await {
            Ok(Some(review_id)) => match self.db.reviews().fail(review_id, &message).await {
                Ok(true) => info!(review_id, "Marked review failed"),
                Ok(false) => debug!(review_id, "Review already terminal"),
                Err(e) => warn!(review_id, error = %e, "Could not mark review failed"),
            },
            Ok(None) => debug!(run_id = %run.id, "No active review to mark failed"),
            Err(e) => warn!(run_id = %run.id, error = %e, "Could not look up review for run"),
        }

        if let Err(e) = self.db.pipeline_runs().mark_failed(&run.id, &message).await {
            warn!(run_id = %run.id, error = %e, "Could not mark run failed");
        }

        RunOutcome::Failed { message }
    }

    async fn find_active_review(&self, run: &PipelineRun) -> Result<Option<i64>> {
        let Some(repository) = self
            .db
            .repositories()
            .find_by_full_name(&run.owner, &run.repo)
            .await?
        else {
            return Ok(None);
        };
        Ok(self
            .db
            .reviews()
            .latest_active_for_pr(repository.id, run.pr_number)
            .await?
            .map(|review| review.id))
    }
}

/// Split validated comments by whether the diff has their position
fn partition_comments<'a>(
    output: &'a ReviewOutput,
    index: &DiffIndex,
) -> (Vec<&'a InlineComment>, Vec<&'a InlineComment>) {
    let mut accepted = Vec::new();
    let mut rejected = Vec::new();
    for comment in &output.comments {
        // validate() guarantees line >= 1
        if index.is_commentable(&comment.path, comment.line as u64, comment.side()) {
            accepted.push(comment);
        } else {
            rejected.push(comment);
        }
    }
    (accepted, rejected)
}

/// Map requested thread responses onto threads that actually exist
///
/// Responses aimed at unknown comment ids are dropped. Resolution is honored
/// only when no active human discussion is going on in the thread.
fn thread_replies_for(output: &ReviewOutput, threads: &[CommentThread]) -> Vec<ThreadReply> {
    let by_root: HashMap<u64, &CommentThread> =
        threads.iter().map(|t| (t.root.id, t)).collect();

    output
        .thread_responses
        .iter()
        .filter_map(|response| {
            let thread = by_root.get(&response.comment_id)?;
            Some(ThreadReply {
                comment_id: response.comment_id,
                body: response.reply.clone(),
                resolve: response.resolve && !thread.has_active_discussion,
            })
        })
        .collect()
}

fn render_comment_body(comment: &InlineComment) -> String {
    match &comment.suggestion {
        Some(suggestion) => format!(
            "{}\n\n```suggestion\n{}\n```",
            comment.body, suggestion
        ),
        None => comment.body.clone(),
    }
}

fn prompt_vars(
    run: &PipelineRun,
    pr: &PrSnapshot,
    diff: &DiffSnapshot,
    threads: &ThreadsSnapshot,
    patch_id: &str,
) -> HashMap<String, String> {
    let mut vars = HashMap::new();
    vars.insert("OWNER".to_string(), run.owner.clone());
    vars.insert("REPO".to_string(), run.repo.clone());
    vars.insert("PR_NUMBER".to_string(), run.pr_number.to_string());
    vars.insert("PR_TITLE".to_string(), pr.info.title.clone());
    vars.insert("PR_BODY".to_string(), pr.info.body.clone());
    vars.insert("PR_AUTHOR".to_string(), pr.info.author.clone());
    vars.insert("HEAD_SHA".to_string(), pr.info.head_sha.clone());
    vars.insert("BASE_REF".to_string(), pr.info.base_ref.clone());
    vars.insert("MERGE_BASE".to_string(), pr.merge_base_sha.clone());
    vars.insert(
        "CHANGED_FILES".to_string(),
        pr.info.changed_files.to_string(),
    );
    vars.insert("ADDITIONS".to_string(), pr.info.additions.to_string());
    vars.insert("DELETIONS".to_string(), pr.info.deletions.to_string());
    vars.insert("TRIGGER".to_string(), run.trigger_kind.clone());
    vars.insert("PATCH_ID".to_string(), patch_id.to_string());
    vars.insert("DIFF".to_string(), diff.diff.clone());
    vars.insert(
        "COMMENT_COUNT".to_string(),
        threads.comment_count.to_string(),
    );
    vars.insert(
        "EXISTING_THREADS".to_string(),
        render_threads(&threads.threads),
    );
    vars
}

/// Render existing threads as a markdown digest for the prompt
fn render_threads(threads: &[CommentThread]) -> String {
    let mut out = String::new();
    for thread in threads {
        let location = match (&thread.root.path, thread.root.line) {
            (Some(path), Some(line)) => format!("{}:{}", path, line),
            (Some(path), None) => path.clone(),
            _ => "(general)".to_string(),
        };
        let activity = if thread.has_active_discussion {
            " (active discussion)"
        } else {
            ""
        };
        out.push_str(&format!(
            "- Thread {} at {} by @{}{}:\n  {}\n",
            thread.root.id,
            location,
            thread.root.author,
            activity,
            digest(&thread.root.body)
        ));
        for reply in &thread.replies {
            out.push_str(&format!("  - @{}: {}\n", reply.author, digest(&reply.body)));
        }
    }
    out
}

/// Flatten and bound a comment body for inclusion in the prompt
fn digest(body: &str) -> String {
    const MAX_CHARS: usize = 400;
    let flat = body.replace('\n', " ");
    if flat.chars().count() <= MAX_CHARS {
        flat
    } else {
        let truncated: String = flat.chars().take(MAX_CHARS).collect();
        format!("{}...", truncated)
    }
}

fn short_sha(sha: &str) -> &str {
    sha.get(..7).unwrap_or(sha)
}

/// Identifier tying a prompt to the exact reviewed state
fn patch_id_for(head_sha: &str) -> String {
    format!("{}-{}", short_sha(head_sha), Utc::now().timestamp())
}

fn verdict_phrase(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Approve => "approved",
        Verdict::RequestChanges => "requested changes",
        Verdict::Comment => "left comments",
    }
}

fn too_large_body(line_count: u64, limit: usize) -> String {
    format!(
        "{}\n:bird: Magpie skipped this pull request: the diff changes {} lines, \
         above the {} line review limit. Split the change or request a manual review.",
        STATUS_MARKER, line_count, limit
    )
}
