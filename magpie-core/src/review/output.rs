//! Validation of the generative service's structured reply
//!
//! The model's reply is untrusted text until it passes [`ReviewOutput::validate`].
//! Later pipeline steps only ever see the validated value, never the raw reply.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Review verdict, mirroring the hosting platform's review events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "APPROVE")]
    Approve,
    #[serde(rename = "REQUEST_CHANGES")]
    RequestChanges,
    #[serde(rename = "COMMENT")]
    Comment,
}

impl Verdict {
    pub fn as_str(&self) -> &str {
        match self {
            Verdict::Approve => "APPROVE",
            Verdict::RequestChanges => "REQUEST_CHANGES",
            Verdict::Comment => "COMMENT",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which side of the diff an inline comment anchors to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    #[serde(rename = "LEFT")]
    Left,
    #[serde(rename = "RIGHT")]
    Right,
}

impl Side {
    pub fn as_str(&self) -> &str {
        match self {
            Side::Left => "LEFT",
            Side::Right => "RIGHT",
        }
    }
}

/// Inline comment proposed by the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InlineComment {
    pub path: String,
    pub line: i64,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Defaults to the new side of the diff when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side: Option<Side>,
}

impl InlineComment {
    pub fn side(&self) -> Side {
        self.side.unwrap_or(Side::Right)
    }
}

/// Reply the model proposes for an existing comment thread
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadResponse {
    /// Root comment id of the thread being answered
    pub comment_id: u64,
    pub reply: String,
    /// Request resolution of the thread
    #[serde(default)]
    pub resolve: bool,
}

/// Validated structured output of one review invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewOutput {
    pub body: String,
    pub verdict: Verdict,
    #[serde(default)]
    pub comments: Vec<InlineComment>,
    #[serde(default)]
    pub thread_responses: Vec<ThreadResponse>,
    #[serde(default)]
    pub reviewed_files: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl ReviewOutput {
    /// Parse and validate a raw model reply
    ///
    /// A surrounding markdown code fence is tolerated; everything else about
    /// the shape is strict. Any violation is a hard validation failure.
    pub fn validate(raw: &str) -> Result<Self> {
        let json = strip_code_fence(raw);

        let output: ReviewOutput = serde_json::from_str(json)
            .map_err(|e| Error::Validation(format!("Malformed review output: {}", e)))?;

        output.check()?;
        Ok(output)
    }

    fn check(&self) -> Result<()> {
        for comment in &self.comments {
            if comment.path.is_empty() {
                return Err(Error::Validation(
                    "Inline comment with empty path".to_string(),
                ));
            }
            if comment.line < 1 {
                return Err(Error::Validation(format!(
                    "Inline comment on {} has non-positive line {}",
                    comment.path, comment.line
                )));
            }
        }

        if let Some(confidence) = self.confidence {
            if !(0.0..=1.0).contains(&confidence) {
                return Err(Error::Validation(format!(
                    "Confidence {} outside [0, 1]",
                    confidence
                )));
            }
        }

        for response in &self.thread_responses {
            if response.reply.is_empty() {
                return Err(Error::Validation(format!(
                    "Empty reply for thread {}",
                    response.comment_id
                )));
            }
        }

        Ok(())
    }
}

/// Strip one surrounding markdown code fence, if present
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();

    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the info string (e.g. "json") on the opening fence line
    let Some(newline) = rest.find('\n') else {
        return trimmed;
    };
    let inner = &rest[newline + 1..];

    match inner.rfind("```") {
        Some(end) => inner[..end].trim(),
        None => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_reply() -> String {
        serde_json::json!({
            "body": "Solid change overall.",
            "verdict": "APPROVE",
            "comments": [
                {"path": "src/lib.rs", "line": 42, "body": "Prefer `?` here"}
            ],
            "confidence": 0.85
        })
        .to_string()
    }

    #[test]
    fn test_valid_reply_parses() {
        let output = ReviewOutput::validate(&valid_reply()).unwrap();
        assert_eq!(output.verdict, Verdict::Approve);
        assert_eq!(output.comments.len(), 1);
        assert_eq!(output.comments[0].side(), Side::Right);
        assert_eq!(output.confidence, Some(0.85));
        assert!(output.thread_responses.is_empty());
    }

    #[test]
    fn test_fenced_reply_parses() {
        let fenced = format!("```json\n{}\n```", valid_reply());
        let output = ReviewOutput::validate(&fenced).unwrap();
        assert_eq!(output.verdict, Verdict::Approve);
    }

    #[test]
    fn test_unknown_verdict_rejected() {
        let raw = serde_json::json!({
            "body": "Hmm",
            "verdict": "MAYBE"
        })
        .to_string();
        let err = ReviewOutput::validate(&raw).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_negative_line_rejected() {
        let raw = serde_json::json!({
            "body": "Hmm",
            "verdict": "COMMENT",
            "comments": [{"path": "src/lib.rs", "line": -1, "body": "?"}]
        })
        .to_string();
        let err = ReviewOutput::validate(&raw).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_zero_line_rejected() {
        let raw = serde_json::json!({
            "body": "Hmm",
            "verdict": "COMMENT",
            "comments": [{"path": "src/lib.rs", "line": 0, "body": "?"}]
        })
        .to_string();
        assert!(ReviewOutput::validate(&raw).is_err());
    }

    #[test]
    fn test_confidence_out_of_range_rejected() {
        let raw = serde_json::json!({
            "body": "Hmm",
            "verdict": "COMMENT",
            "confidence": 1.5
        })
        .to_string();
        assert!(ReviewOutput::validate(&raw).is_err());
    }

    #[test]
    fn test_missing_body_rejected() {
        let raw = serde_json::json!({"verdict": "APPROVE"}).to_string();
        assert!(ReviewOutput::validate(&raw).is_err());
    }

    #[test]
    fn test_left_side_parses() {
        let raw = serde_json::json!({
            "body": "Removed line concern",
            "verdict": "REQUEST_CHANGES",
            "comments": [
                {"path": "src/lib.rs", "line": 10, "body": "This deletion drops the guard", "side": "LEFT"}
            ]
        })
        .to_string();
        let output = ReviewOutput::validate(&raw).unwrap();
        assert_eq!(output.comments[0].side(), Side::Left);
    }

    #[test]
    fn test_thread_responses_parse() {
        let raw = serde_json::json!({
            "body": "Re-review",
            "verdict": "COMMENT",
            "thread_responses": [
                {"comment_id": 991, "reply": "Fixed in the latest push", "resolve": true},
                {"comment_id": 992, "reply": "Still open"}
            ]
        })
        .to_string();
        let output = ReviewOutput::validate(&raw).unwrap();
        assert_eq!(output.thread_responses.len(), 2);
        assert!(output.thread_responses[0].resolve);
        assert!(!output.thread_responses[1].resolve);
    }

    #[test]
    fn test_plain_text_rejected() {
        assert!(ReviewOutput::validate("Looks good to me!").is_err());
    }
}
