//! Magpie Core - Core library for automated pull request review
//!
//! This crate provides the review pipeline: webhook event classification,
//! diff indexing, prompt assembly, model invocation, output validation, and
//! the checkpointed engine that drives a pull request from trigger to
//! posted review.

pub mod config;
pub mod diff;
pub mod error;
pub mod event;
pub mod host;
pub mod model;
pub mod pipeline;
pub mod prompt;
pub mod review;
pub mod secrets;
pub mod threads;

pub use config::Config;
pub use error::{Error, Result};
pub use secrets::Secrets;
