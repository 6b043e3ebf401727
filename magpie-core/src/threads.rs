//! Grouping of pull request comments into discussion threads
//!
//! The hosting platform returns review comments as a flat list where each
//! reply points at its parent. Reviews and thread replies both need the
//! grouped view, plus a judgement of whether humans are still talking in a
//! thread so the reviewer does not resolve it out from under them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::host::PrComment;

/// Bot logins without the `[bot]` suffix seen in the wild
const KNOWN_BOTS: &[&str] = &["dependabot", "renovate", "github-actions", "codecov", "copilot"];

/// One root comment and its ordered replies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentThread {
    pub root: PrComment,
    pub replies: Vec<PrComment>,
    pub reply_count: usize,
    /// Humans other than the root author are still engaged
    pub has_active_discussion: bool,
}

impl CommentThread {
    pub fn root_id(&self) -> u64 {
        self.root.id
    }
}

/// Whether a login belongs to an automated account
pub fn is_bot(login: &str) -> bool {
    let login = login.to_ascii_lowercase();
    login.ends_with("[bot]")
        || login.ends_with("-bot")
        || KNOWN_BOTS.contains(&login.as_str())
}

/// Group a flat comment list into threads
///
/// Parent links are resolved transitively so replies-to-replies land in the
/// root's thread. A reply whose parent is unknown is promoted to a root of
/// its own rather than dropped.
pub fn build_threads(comments: &[PrComment]) -> Vec<CommentThread> {
    let by_id: HashMap<u64, &PrComment> = comments.iter().map(|c| (c.id, c)).collect();

    let mut grouped: HashMap<u64, Vec<&PrComment>> = HashMap::new();
    let mut roots: Vec<&PrComment> = Vec::new();

    for comment in comments {
        let root_id = resolve_root(comment, &by_id);
        if root_id == comment.id {
            roots.push(comment);
        } else {
            grouped.entry(root_id).or_default().push(comment);
        }
    }

    roots.sort_by_key(|c| (c.created_at, c.id));

    roots
        .into_iter()
        .map(|root| {
            let mut replies: Vec<PrComment> = grouped
                .remove(&root.id)
                .unwrap_or_default()
                .into_iter()
                .cloned()
                .collect();
            replies.sort_by_key(|c| (c.created_at, c.id));

            let has_active_discussion = discussion_is_active(root, &replies);
            CommentThread {
                root: root.clone(),
                reply_count: replies.len(),
                replies,
                has_active_discussion,
            }
        })
        .collect()
}

/// Upper bound on parent hops, guards against malformed cycles
const MAX_THREAD_DEPTH: usize = 64;

/// Follow parent links up to the thread root
fn resolve_root(comment: &PrComment, by_id: &HashMap<u64, &PrComment>) -> u64 {
    let mut current = comment;
    for _ in 0..MAX_THREAD_DEPTH {
        let Some(parent_id) = current.parent_id else {
            return current.id;
        };
        match by_id.get(&parent_id) {
            Some(parent) => current = parent,
            // Parent outside the fetched window; treat this comment as a root
            None => return comment.id,
        }
    }
    comment.id
}

/// A thread counts as active when humans other than the root author are
/// engaged: either the latest human reply is from someone else, or at least
/// two humans have replied.
fn discussion_is_active(root: &PrComment, replies: &[PrComment]) -> bool {
    let human_replies: Vec<&PrComment> =
        replies.iter().filter(|r| !is_bot(&r.author)).collect();

    let Some(last) = human_replies.last() else {
        return false;
    };

    if last.author != root.author {
        return true;
    }

    let mut authors: Vec<&str> = human_replies.iter().map(|r| r.author.as_str()).collect();
    authors.sort_unstable();
    authors.dedup();
    human_replies.len() >= 2 && authors.len() >= 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn comment(id: u64, parent_id: Option<u64>, author: &str, minute: u32) -> PrComment {
        PrComment {
            id,
            parent_id,
            author: author.to_string(),
            body: format!("comment {}", id),
            path: Some("src/lib.rs".to_string()),
            line: Some(10),
            created_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, minute, 0).unwrap(),
        }
    }

    #[test]
    fn test_reply_from_another_human_is_active() {
        let comments = vec![
            comment(1, None, "alice", 0),
            comment(2, Some(1), "bob", 1),
        ];
        let threads = build_threads(&comments);
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].reply_count, 1);
        assert!(threads[0].has_active_discussion);
    }

    #[test]
    fn test_self_replies_are_not_active() {
        let comments = vec![
            comment(1, None, "alice", 0),
            comment(2, Some(1), "alice", 1),
            comment(3, Some(1), "alice", 2),
        ];
        let threads = build_threads(&comments);
        assert!(!threads[0].has_active_discussion);
    }

    #[test]
    fn test_bot_replies_are_not_active() {
        let comments = vec![
            comment(1, None, "alice", 0),
            comment(2, Some(1), "dependabot[bot]", 1),
        ];
        let threads = build_threads(&comments);
        assert!(!threads[0].has_active_discussion);
    }

    #[test]
    fn test_two_other_humans_are_active() {
        let comments = vec![
            comment(1, None, "alice", 0),
            comment(2, Some(1), "bob", 1),
            comment(3, Some(1), "carol", 2),
        ];
        let threads = build_threads(&comments);
        assert!(threads[0].has_active_discussion);
    }

    #[test]
    fn test_back_and_forth_ending_with_root_author_is_active() {
        // bob raised something, alice answered; conversation is live
        let comments = vec![
            comment(1, None, "alice", 0),
            comment(2, Some(1), "bob", 1),
            comment(3, Some(1), "alice", 2),
        ];
        let threads = build_threads(&comments);
        assert!(threads[0].has_active_discussion);
    }

    #[test]
    fn test_transitive_replies_reach_the_root() {
        let comments = vec![
            comment(1, None, "alice", 0),
            comment(2, Some(1), "bob", 1),
            comment(3, Some(2), "carol", 2),
        ];
        let threads = build_threads(&comments);
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].reply_count, 2);
        assert_eq!(threads[0].replies[0].id, 2);
        assert_eq!(threads[0].replies[1].id, 3);
    }

    #[test]
    fn test_orphan_reply_becomes_root() {
        let comments = vec![comment(5, Some(999), "bob", 0)];
        let threads = build_threads(&comments);
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].root.id, 5);
        assert_eq!(threads[0].reply_count, 0);
    }

    #[test]
    fn test_threads_sorted_by_root_creation() {
        let comments = vec![
            comment(10, None, "bob", 5),
            comment(2, None, "alice", 1),
            comment(11, Some(10), "carol", 6),
        ];
        let threads = build_threads(&comments);
        assert_eq!(threads[0].root.id, 2);
        assert_eq!(threads[1].root.id, 10);
    }

    #[test]
    fn test_replies_sorted_by_time() {
        let comments = vec![
            comment(1, None, "alice", 0),
            comment(3, Some(1), "carol", 9),
            comment(2, Some(1), "bob", 4),
        ];
        let threads = build_threads(&comments);
        assert_eq!(threads[0].replies[0].id, 2);
        assert_eq!(threads[0].replies[1].id, 3);
    }

    #[test]
    fn test_is_bot() {
        assert!(is_bot("dependabot[bot]"));
        assert!(is_bot("Renovate"));
        assert!(is_bot("deploy-bot"));
        assert!(is_bot("github-actions[bot]"));
        assert!(!is_bot("alice"));
        assert!(!is_bot("botwright"));
    }

    #[test]
    fn test_empty_input() {
        assert!(build_threads(&[]).is_empty());
    }
}
