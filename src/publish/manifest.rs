use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::source::SourceFile;

/// One publish run, loaded from a TOML file.
///
/// Example TOML:
/// ```toml
/// branch = "fix/timeout-handling"
/// commit_message = "Fix timeout handling"
/// title = "Fix timeout handling"
/// description = "Raise the client timeout"
/// ssh_private_key_path = "/tmp/fixbot/id_ed25519"
/// parameter_prefix = "/self-healing-code/"
///
/// [[files]]
/// filename = "app/handler.py"
/// contents = "TIMEOUT = 30\n"
/// ```
#[derive(Debug, Deserialize)]
pub struct PublishManifest {
    pub branch: String,
    pub commit_message: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub ssh_private_key_path: PathBuf,
    #[serde(default)]
    pub ssh_user: Option<String>,
    #[serde(default)]
    pub repo_url: Option<String>,
    /// Read `repo_url` and `repo_ssh_private_key` from the parameter store.
    #[serde(default)]
    pub parameter_prefix: Option<String>,
    /// Aws region of the parameter store. Defaults to the SDK chain.
    #[serde(default)]
    pub parameter_region: Option<String>,
    /// Clone target; a temporary directory when unset.
    #[serde(default)]
    pub work_dir: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub format_code: bool,
    #[serde(default)]
    pub verify_host_key: bool,
    #[serde(default)]
    pub files: Vec<SourceFile>,
}

fn default_true() -> bool {
    true
}

impl PublishManifest {
    pub fn from_toml(txt: &str) -> Result<Self> {
        toml::from_str(txt).context("failed to parse publish manifest")
    }

    /// # Errors
    /// - Returns an error if the file cannot be read.
    /// - Returns an error if parsing the TOML fails.
    pub fn load(path: &Path) -> Result<Self> {
        let txt = fs::read_to_string(path)
            .with_context(|| format!("manifest not found: {}", path.display()))?;
        Self::from_toml(&txt).with_context(|| format!("in {}", path.display()))
    }
}
