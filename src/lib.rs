//! Crate entry point for **fixbot**.
//!
//! This library provides the internal implementation for the `fixbot` CLI.
//! Each submodule encapsulates one responsibility (prompting, parameter storage,
//! git operations, pull requests, etc.).
//! The `pub use` re-exports make the two flows accessible directly from the crate root:
//! - [`cmd_configure`] seeds the parameter store interactively
//! - [`cmd_publish`] rewrites files in a repository and opens a pull request

mod aws;
pub mod configure;
pub mod error;
pub mod format;
pub mod git;
mod paths;
pub mod provider;
pub mod publish;
pub mod repo_url;
pub mod source;
pub mod store;

pub use configure::{CollectorConfig, cmd_configure};
pub use error::{ConfigError, FormatError, ValidationError};
pub use paths::sanitize_path;
pub use provider::{CodeCommitProvider, GitProvider};
pub use publish::{PublishOutcome, cmd_publish};
pub use repo_url::{RepoUrl, get_repo_name};
pub use store::{ParameterStore, ParameterType, SsmParameterStore};
