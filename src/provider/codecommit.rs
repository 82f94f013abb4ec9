use anyhow::{Context, Result};
use aws_sdk_codecommit::Client;
use aws_sdk_codecommit::types::Target;
use tokio::runtime::Runtime;

use super::{DESTINATION_REF, GitProvider, report_created};
use crate::aws::{blocking_runtime, load_sdk_config};

/// AWS CodeCommit provider.
///
/// Opens pull requests through the CodeCommit API for a single repository.
pub struct CodeCommitProvider {
    repo_name: String,
    runtime: Runtime,
    client: Client,
}

impl CodeCommitProvider {
    pub fn new(repo_name: impl Into<String>, region: &str) -> Result<Self> {
        let runtime = blocking_runtime()?;
        let sdk_config = load_sdk_config(&runtime, Some(region));
        let client = Client::new(&sdk_config);
        Ok(Self {
            repo_name: repo_name.into(),
            runtime,
            client,
        })
    }

    pub fn from_conf(repo_name: impl Into<String>, conf: aws_sdk_codecommit::Config) -> Result<Self> {
        Ok(Self {
            repo_name: repo_name.into(),
            runtime: blocking_runtime()?,
            client: Client::from_conf(conf),
        })
    }
}

impl GitProvider for CodeCommitProvider {
    fn create_pull_request(
        &self,
        branch: &str,
        title: &str,
        description: &str,
    ) -> Result<Option<String>> {
        let target = Target::builder()
            .repository_name(&self.repo_name)
            .source_reference(branch)
            .destination_reference(DESTINATION_REF)
            .build()
            .context("invalid pull request target")?;

        let out = self
            .runtime
            .block_on(
                self.client
                    .create_pull_request()
                    .title(title)
                    .description(description)
                    .targets(target)
                    .send(),
            )
            .with_context(|| format!("codecommit create-pull-request {}", self.repo_name))?;

        let id = out
            .pull_request()
            .and_then(|pr| pr.pull_request_id())
            .map(str::to_string);
        Ok(report_created(id))
    }
}
