//! Structured review output contract

mod output;

pub use output::{InlineComment, ReviewOutput, Side, ThreadResponse, Verdict};
