//! Git integration layer.
//!
//! This module wraps the actual backend implementation (`git2_backend`)
//! and re-exports only the operations the publish flow needs.
//!
//! The idea is to hide internal implementation details (currently based on `git2` crate)
//! so that callers only see clone / branch-and-push and the SSH settings they take.

mod git2_backend;

use std::path::PathBuf;

pub use git2_backend::{clone_repo, create_branch, has_changes, push_branch};

/// Author identity written into every cloned repository's local config.
pub const BOT_NAME: &str = "fix-code-bot";
pub const BOT_EMAIL: &str = "fix@code.bot";

/// What to do with the remote's SSH host key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HostKeyPolicy {
    /// Accept any host key.
    #[default]
    Ignore,
    /// Let libgit2 check the key against `known_hosts`.
    Verify,
}

/// SSH credentials for talking to `origin`.
#[derive(Debug, Clone)]
pub struct SshAuth {
    pub private_key_path: PathBuf,
    /// Login name when the URL carries none. CodeCommit expects the SSH key ID.
    pub username: Option<String>,
    pub host_key_policy: HostKeyPolicy,
}

impl SshAuth {
    pub fn new(private_key_path: impl Into<PathBuf>) -> Self {
        Self {
            private_key_path: private_key_path.into(),
            username: None,
            host_key_policy: HostKeyPolicy::default(),
        }
    }
}
