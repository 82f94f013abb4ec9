use std::sync::LazyLock;

use regex::Regex;

use crate::error::ValidationError;

static CODECOMMIT_SSH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^ssh://git-codecommit\.([a-z0-9-]+)\.amazonaws\.com/v1/repos/([a-zA-Z0-9._-]+)$",
    )
    .expect("static regex")
});

/// A CodeCommit SSH repository URL split into its parts.
///
/// Accepted form: `ssh://git-codecommit.<region>.amazonaws.com/v1/repos/<name>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoUrl {
    pub region: String,
    pub name: String,
}

impl RepoUrl {
    /// Parse `url`, rejecting anything that is not a CodeCommit SSH URL.
    ///
    /// # Errors
    /// Returns [`ValidationError::RepoUrl`] naming the offending URL.
    pub fn parse(url: &str) -> Result<Self, ValidationError> {
        let caps = CODECOMMIT_SSH
            .captures(url)
            .ok_or_else(|| ValidationError::RepoUrl {
                url: url.to_string(),
            })?;
        Ok(Self {
            region: caps[1].to_string(),
            name: caps[2].to_string(),
        })
    }
}

/// Extract the repository name from a CodeCommit SSH URL.
pub fn get_repo_name(url: &str) -> Result<String, ValidationError> {
    RepoUrl::parse(url).map(|u| u.name)
}
