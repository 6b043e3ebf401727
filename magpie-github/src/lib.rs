//! Magpie GitHub - GitHub integration for the magpie review service
//!
//! This crate implements the pipeline's host-API surface over the GitHub
//! REST API, falling back to raw endpoints where octocrab has no typed
//! support (diff media type, compare, review submission, thread replies)
//! and to GraphQL for review-thread resolution.

mod client;
mod comments;
mod error;
mod graphql;
mod host;
mod pulls;
mod reviews;

pub use client::GitHubClient;
pub use error::{Error, Result};
