//! Checkpointed execution of the review pipeline

mod engine;
mod locks;
mod steps;

pub use engine::{Pipeline, RunOutcome, SkipReason, STATUS_MARKER};
pub use locks::PrLocks;
pub use steps::{
    DiffSnapshot, Finalized, ModelSnapshot, PrSnapshot, PromptSnapshot, ReviewHandle,
    ReviewPosted, StatusPosted, StepName, ThreadsSnapshot,
};
