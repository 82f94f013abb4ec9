//! Typed errors for the conditions callers may want to match on.
//!
//! Everything else travels as [`anyhow::Error`] with context attached at the
//! call site.

use std::process::ExitStatus;

use thiserror::Error;

/// Input that is rejected before any side effect happens.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The repository URL is not a CodeCommit SSH URL.
    #[error("repository URL is not a CodeCommit SSH URL: {url}")]
    RepoUrl { url: String },

    /// A source file path is absolute, escapes the working tree or points into `.git`.
    #[error("source file path must stay inside the working tree and out of .git: {path}")]
    SourcePath { path: String },
}

/// Configuration that could not be obtained.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no value provided for `{key}`")]
    NoValue { key: String },

    #[error("publish manifest needs `repo_url` or `parameter_prefix`")]
    MissingRepoUrl,

    #[error("parameter `{name}` has no value in the parameter store")]
    MissingParameter { name: String },
}

/// Failures of the external code formatter.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("failed to run formatter `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("formatter `{program}` exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("formatter `{program}` produced non UTF-8 output")]
    Utf8 { program: String },
}
