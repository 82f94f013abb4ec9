//! Source update & publish flow.
//!
//! `clone → write files → (nothing changed | branch → commit → push) → pull request`
//!
//! Each step runs once; the first failure stops the run and leaves whatever was
//! already done (a pushed branch, a dirty checkout) in place.

mod manifest;

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::ConfigError;
use crate::format::{CommandFormatter, Formatter};
use crate::git::{HostKeyPolicy, SshAuth, clone_repo, create_branch};
use crate::paths::sanitize_path;
use crate::provider::{CodeCommitProvider, GitProvider};
use crate::repo_url::RepoUrl;
use crate::source::{SourceFile, update_source_code, write_private_key};
use crate::store::{ParameterStore, SsmParameterStore};

pub use manifest::PublishManifest;

/// Everything one run needs, with all lookups already done.
#[derive(Debug, Clone)]
pub struct PublishJob {
    pub repo_url: String,
    pub work_dir: PathBuf,
    pub auth: SshAuth,
    pub branch: String,
    pub commit_message: String,
    pub title: String,
    pub description: String,
    pub files: Vec<SourceFile>,
}

/// What a run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    /// A branch with the new contents was pushed.
    pub pushed: bool,
    /// Id of the opened pull request, if the provider returned one.
    pub pull_request_id: Option<String>,
}

/// Run the publish flow for `job`.
///
/// The pull request is only requested when a branch was pushed.
///
/// # Errors
/// Clone, formatting, file, commit, push and provider transport errors are
/// returned unchanged. A provider answer without an id is not an error; see
/// [`PublishOutcome::pull_request_id`].
pub fn publish(
    job: &PublishJob,
    provider: &dyn GitProvider,
    formatter: Option<&dyn Formatter>,
) -> Result<PublishOutcome> {
    let repo = clone_repo(&job.repo_url, &job.work_dir, &job.auth)?;
    update_source_code(&job.files, &job.work_dir, formatter)?;

    if !create_branch(&repo, &job.auth, &job.branch, &job.commit_message)? {
        return Ok(PublishOutcome {
            pushed: false,
            pull_request_id: None,
        });
    }

    let pull_request_id =
        provider.create_pull_request(&job.branch, &job.title, &job.description)?;
    Ok(PublishOutcome {
        pushed: true,
        pull_request_id,
    })
}

/// Turn a manifest into a [`PublishJob`] cloning into `work_dir`, together
/// with the CodeCommit repository its URL points at.
///
/// With a `parameter_prefix`, the repository URL (unless given inline) and the
/// SSH key come from `store`, and the key is written to `ssh_private_key_path`.
/// The URL is checked before anything is written.
///
/// # Errors
/// - [`ConfigError::MissingRepoUrl`] when neither `repo_url` nor a prefix is set.
/// - [`ConfigError::MissingParameter`] when the store lacks a needed value.
/// - [`crate::ValidationError::RepoUrl`] when the URL is not a CodeCommit SSH URL.
pub fn resolve_job(
    manifest: &PublishManifest,
    store: Option<&dyn ParameterStore>,
    work_dir: &Path,
) -> Result<(PublishJob, RepoUrl)> {
    let lookup = match (&manifest.parameter_prefix, store) {
        (Some(prefix), Some(store)) => Some((sanitize_path(prefix), store)),
        _ => None,
    };
    let fetch = |prefix: &str, store: &dyn ParameterStore, key: &str| -> Result<String> {
        let name = format!("{}{}", prefix, key);
        store
            .get_parameter(&name)?
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConfigError::MissingParameter { name }.into())
    };

    let repo_url = match (&manifest.repo_url, &lookup) {
        (Some(url), _) => url.clone(),
        (None, Some((prefix, store))) => fetch(prefix.as_str(), *store, "repo_url")?,
        (None, None) => return Err(ConfigError::MissingRepoUrl.into()),
    };
    let target = RepoUrl::parse(&repo_url)?;

    if let Some((prefix, store)) = &lookup {
        let key = fetch(prefix.as_str(), *store, "repo_ssh_private_key")?;
        write_private_key(&manifest.ssh_private_key_path, &key)?;
        info!(path = %manifest.ssh_private_key_path.display(), "wrote ssh private key");
    }

    let job = PublishJob {
        repo_url,
        work_dir: work_dir.to_path_buf(),
        auth: SshAuth {
            private_key_path: manifest.ssh_private_key_path.clone(),
            username: manifest.ssh_user.clone(),
            host_key_policy: if manifest.verify_host_key {
                HostKeyPolicy::Verify
            } else {
                HostKeyPolicy::Ignore
            },
        },
        branch: manifest.branch.clone(),
        commit_message: manifest.commit_message.clone(),
        title: manifest.title.clone(),
        description: manifest.description.clone(),
        files: manifest.files.clone(),
    };
    Ok((job, target))
}

/// CLI command: run the publish flow described by the manifest at `path`.
///
/// Exits with an error when a branch was pushed but no pull request id came
/// back, so an operator notices the half-finished state.
pub fn cmd_publish(path: &Path) -> Result<()> {
    let manifest = PublishManifest::load(path)?;

    let store = match &manifest.parameter_prefix {
        Some(_) => Some(SsmParameterStore::new(manifest.parameter_region.as_deref())?),
        None => None,
    };

    // Keeps a temporary checkout alive until the run is over.
    let (_tmp, work_dir) = match &manifest.work_dir {
        Some(dir) => (None, dir.clone()),
        None => {
            let tmp = tempfile::tempdir().context("failed to create work dir")?;
            let dir = tmp.path().join("checkout");
            (Some(tmp), dir)
        }
    };

    let (job, target) = resolve_job(
        &manifest,
        store.as_ref().map(|s| s as &dyn ParameterStore),
        &work_dir,
    )?;
    let provider = CodeCommitProvider::new(&target.name, &target.region)?;
    let black = CommandFormatter::black();
    let formatter = manifest.format_code.then_some(&black as &dyn Formatter);

    let outcome = publish(&job, &provider, formatter)?;
    match (outcome.pushed, outcome.pull_request_id) {
        (false, _) => info!("nothing to publish"),
        (true, Some(id)) => info!(branch = %job.branch, pull_request_id = %id, "published"),
        (true, None) => {
            warn!(branch = %job.branch, "branch pushed without a pull request");
            bail!("branch {} was pushed but no pull request was created", job.branch);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::store::ParameterType;
    use crate::store::memory::MemoryStore;
    use git2::{Repository, Signature};
    use std::cell::RefCell;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    /// Records calls and answers with a fixed id.
    struct RecordingProvider {
        id: Option<String>,
        calls: RefCell<Vec<(String, String, String)>>,
    }

    impl RecordingProvider {
        fn answering(id: Option<&str>) -> Self {
            Self {
                id: id.map(str::to_string),
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl GitProvider for RecordingProvider {
        fn create_pull_request(
            &self,
            branch: &str,
            title: &str,
            description: &str,
        ) -> Result<Option<String>> {
            self.calls
                .borrow_mut()
                .push((branch.into(), title.into(), description.into()));
            Ok(self.id.clone())
        }
    }

    struct Upper;

    impl Formatter for Upper {
        fn recognizes(&self, path: &Path) -> bool {
            path.extension().is_some_and(|e| e == "py")
        }

        fn format(&self, source: &str) -> Result<String> {
            Ok(source.to_uppercase())
        }
    }

    fn bare_origin() -> (TempDir, String) {
        let td = tempdir().unwrap();
        let repo = Repository::init_bare(td.path()).unwrap();
        let sig = Signature::now("seed", "seed@example.com").unwrap();
        let blob = repo.blob(b"x = 1\n").unwrap();
        let mut tb = repo.treebuilder(None).unwrap();
        tb.insert("app.py", blob, 0o100644).unwrap();
        let tree = repo.find_tree(tb.write().unwrap()).unwrap();
        repo.commit(Some("refs/heads/main"), &sig, &sig, "seed", &tree, &[])
            .unwrap();
        repo.set_head("refs/heads/main").unwrap();
        let url = td.path().to_str().unwrap().to_string();
        (td, url)
    }

    fn job(url: &str, work: &Path, files: Vec<SourceFile>) -> PublishJob {
        PublishJob {
            repo_url: url.to_string(),
            work_dir: work.to_path_buf(),
            auth: SshAuth::new(work.with_extension("key")),
            branch: "fix/app".to_string(),
            commit_message: "Fix app".to_string(),
            title: "Fix app".to_string(),
            description: "automated".to_string(),
            files,
        }
    }

    fn manifest(extra: &str) -> PublishManifest {
        PublishManifest::from_toml(&format!(
            r#"
            branch = "fix/app"
            commit_message = "Fix app"
            title = "Fix app"
            ssh_private_key_path = "{}"
            {}
            "#,
            "/nonexistent/key", extra
        ))
        .unwrap()
    }

    #[test]
    fn change_is_pushed_and_pull_request_requested() {
        let (origin_dir, url) = bare_origin();
        let td = tempdir().unwrap();
        let work = td.path().join("checkout");
        let provider = RecordingProvider::answering(Some("7"));

        let outcome = publish(
            &job(&url, &work, vec![SourceFile::new("app.py", "x = 2\n")]),
            &provider,
            Some(&Upper),
        )
        .unwrap();

        assert_eq!(
            outcome,
            PublishOutcome {
                pushed: true,
                pull_request_id: Some("7".to_string())
            }
        );
        assert_eq!(fs::read_to_string(work.join("app.py")).unwrap(), "X = 2\n");
        assert_eq!(
            provider.calls.borrow().as_slice(),
            &[(
                "fix/app".to_string(),
                "Fix app".to_string(),
                "automated".to_string()
            )]
        );
        let origin = Repository::open_bare(origin_dir.path()).unwrap();
        assert!(origin.find_reference("refs/heads/fix/app").is_ok());
    }

    #[test]
    fn unchanged_contents_skip_branch_and_pull_request() {
        let (origin_dir, url) = bare_origin();
        let td = tempdir().unwrap();
        let work = td.path().join("checkout");
        let provider = RecordingProvider::answering(Some("7"));

        let outcome = publish(
            &job(&url, &work, vec![SourceFile::new("app.py", "x = 1\n")]),
            &provider,
            None,
        )
        .unwrap();

        assert!(!outcome.pushed);
        assert!(provider.calls.borrow().is_empty());
        let origin = Repository::open_bare(origin_dir.path()).unwrap();
        assert!(origin.find_reference("refs/heads/fix/app").is_err());
    }

    #[test]
    fn missing_pull_request_id_is_reported_in_outcome() {
        let (_origin, url) = bare_origin();
        let td = tempdir().unwrap();
        let work = td.path().join("checkout");
        let provider = RecordingProvider::answering(None);

        let outcome = publish(
            &job(&url, &work, vec![SourceFile::new("app.py", "x = 3\n")]),
            &provider,
            None,
        )
        .unwrap();

        assert!(outcome.pushed);
        assert_eq!(outcome.pull_request_id, None);
    }

    #[test]
    fn clone_failure_stops_before_writing() {
        let td = tempdir().unwrap();
        let work = td.path().join("checkout");
        let provider = RecordingProvider::answering(Some("7"));
        let missing = td.path().join("no-such-origin");

        let res = publish(
            &job(missing.to_str().unwrap(), &work, vec![SourceFile::new("a.py", "a")]),
            &provider,
            None,
        );

        assert!(res.is_err());
        assert!(!work.join("a.py").exists());
        assert!(provider.calls.borrow().is_empty());
    }

    #[test]
    fn resolve_uses_inline_url_without_store() {
        let m = manifest(r#"repo_url = "ssh://git-codecommit.us-east-1.amazonaws.com/v1/repos/app""#);
        let (job, target) = resolve_job(&m, None, Path::new("/tmp/work")).unwrap();

        assert_eq!(target.name, "app");
        assert_eq!(target.region, "us-east-1");
        assert_eq!(job.repo_url, "ssh://git-codecommit.us-east-1.amazonaws.com/v1/repos/app");
        assert_eq!(job.auth.host_key_policy, HostKeyPolicy::Ignore);
        assert_eq!(job.work_dir, PathBuf::from("/tmp/work"));
    }

    #[test]
    fn resolve_without_url_or_prefix_fails() {
        let err = resolve_job(&manifest(""), None, Path::new("/tmp/work")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::MissingRepoUrl)
        ));
    }

    #[test]
    fn resolve_reads_store_and_writes_key() {
        let td = tempdir().unwrap();
        let key_path = td.path().join("id_ed25519");
        let store = MemoryStore::default();
        store
            .put_parameter(
                "/self-healing-code/repo_url",
                "ssh://git-codecommit.us-west-2.amazonaws.com/v1/repos/app",
                ParameterType::String,
            )
            .unwrap();
        store
            .put_parameter(
                "/self-healing-code/repo_ssh_private_key",
                "KEY\n",
                ParameterType::SecureString,
            )
            .unwrap();

        let mut m = manifest(
            r#"parameter_prefix = "self-healing-code"
            verify_host_key = true"#,
        );
        m.ssh_private_key_path = key_path.clone();
        let (job, _) = resolve_job(&m, Some(&store), td.path()).unwrap();

        assert_eq!(job.repo_url, "ssh://git-codecommit.us-west-2.amazonaws.com/v1/repos/app");
        assert_eq!(job.auth.host_key_policy, HostKeyPolicy::Verify);
        assert_eq!(fs::read_to_string(&key_path).unwrap(), "KEY\n");
    }

    #[test]
    fn resolve_reports_missing_parameter() {
        let store = MemoryStore::default();
        let m = manifest(r#"parameter_prefix = "/p/""#);
        let err = resolve_job(&m, Some(&store), Path::new("/tmp/work")).unwrap_err();

        match err.downcast_ref::<ConfigError>() {
            Some(ConfigError::MissingParameter { name }) => assert_eq!(name, "/p/repo_url"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn resolve_rejects_bad_stored_url_before_writing_key() {
        let td = tempdir().unwrap();
        let key_path = td.path().join("id_ed25519");
        let store = MemoryStore::default();
        store
            .put_parameter("/p/repo_url", "https://example.com/app.git", ParameterType::String)
            .unwrap();
        store
            .put_parameter("/p/repo_ssh_private_key", "KEY\n", ParameterType::SecureString)
            .unwrap();

        let mut m = manifest(r#"parameter_prefix = "/p/""#);
        m.ssh_private_key_path = key_path.clone();
        let err = resolve_job(&m, Some(&store), td.path()).unwrap_err();

        match err.downcast_ref::<ValidationError>() {
            Some(ValidationError::RepoUrl { url }) => assert_eq!(url, "https://example.com/app.git"),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(!key_path.exists());
    }
}
