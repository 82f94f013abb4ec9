use anyhow::{Context, Result, anyhow, bail};
use git2::{
    CertificateCheckStatus, ConfigLevel, Cred, CredentialType, FetchOptions, IndexAddOption,
    PushOptions, RemoteCallbacks, Repository, build::RepoBuilder,
};
use std::path::Path;
use tracing::{debug, info};

use super::{BOT_EMAIL, BOT_NAME, HostKeyPolicy, SshAuth};

/// Build `RemoteCallbacks` that authenticate with the key file in `auth`.
///
/// libgit2 calls the credential callback again after a rejected key; the second
/// call fails instead of looping forever.
fn callbacks_with_key(auth: &SshAuth) -> RemoteCallbacks<'_> {
    let mut cb = RemoteCallbacks::new();
    let mut attempts = 0u32;
    cb.credentials(move |_url, username_from_url, allowed| {
        let user = username_from_url
            .or(auth.username.as_deref())
            .unwrap_or("git");
        if allowed.contains(CredentialType::USERNAME) {
            return Cred::username(user);
        }
        attempts += 1;
        if attempts > 1 {
            return Err(git2::Error::from_str(&format!(
                "ssh key {} was rejected",
                auth.private_key_path.display()
            )));
        }
        Cred::ssh_key(user, None, &auth.private_key_path, None)
    });

    let policy = auth.host_key_policy;
    cb.certificate_check(move |_cert, host| match policy {
        HostKeyPolicy::Ignore => {
            debug!(host, "skipping host key verification");
            Ok(CertificateCheckStatus::CertificateOk)
        }
        HostKeyPolicy::Verify => Ok(CertificateCheckStatus::CertificatePassthrough),
    });
    cb
}

/// Clone `url` into `dest` and set the bot identity in the local config.
///
/// # Errors
/// Returns the underlying git error (authentication, unreachable host,
/// non-empty destination) with the URL as context.
pub fn clone_repo(url: &str, dest: &Path, auth: &SshAuth) -> Result<Repository> {
    info!(url, dest = %dest.display(), "cloning repository");

    let mut fo = FetchOptions::new();
    fo.remote_callbacks(callbacks_with_key(auth));
    let repo = RepoBuilder::new()
        .fetch_options(fo)
        .clone(url, dest)
        .with_context(|| format!("git clone {}", url))?;

    {
        let mut cfg = repo.config()?.open_level(ConfigLevel::Local)?;
        cfg.set_str("user.name", BOT_NAME)?;
        cfg.set_str("user.email", BOT_EMAIL)?;
    }
    Ok(repo)
}

/// Whether tracked files in the working tree differ from the index.
///
/// Untracked files do not count.
pub fn has_changes(repo: &Repository) -> Result<bool> {
    let diff = repo.diff_index_to_workdir(None, None)?;
    Ok(diff.deltas().len() > 0)
}

/// Commit pending changes on a new branch and push it to `origin`.
///
/// - No tracked file changed → nothing happens, returns `false`.
/// - Otherwise:
///   - Creates `branch` at HEAD and switches to it
///   - Stages everything (`git add -A` semantics: new, modified and deleted files)
///   - Commits with the repository's configured identity
///   - Pushes `refs/heads/<branch>` to `origin` under the same name
///   - Returns `true`
///
/// # Errors
/// Any git failure along the way is returned as-is; there is no rollback.
pub fn create_branch(
    repo: &Repository,
    auth: &SshAuth,
    branch: &str,
    message: &str,
) -> Result<bool> {
    if !has_changes(repo)? {
        info!("no source changes, skipping branch creation");
        return Ok(false);
    }
    info!(branch, "source code has been modified, committing changes");

    let head = repo.head()?.peel_to_commit()?;
    let new_branch = repo
        .branch(branch, &head, false)
        .with_context(|| format!("git branch {}", branch))?;
    let refname = new_branch
        .get()
        .name()
        .ok_or_else(|| anyhow!("invalid branch name: {}", branch))?
        .to_string();
    repo.set_head(&refname)?;

    let mut index = repo.index()?;
    index.add_all(["*"].iter(), IndexAddOption::DEFAULT, None)?;
    index.update_all(["*"].iter(), None)?;
    index.write()?;
    let tree = repo.find_tree(index.write_tree()?)?;

    let sig = repo.signature().context("no commit identity configured")?;
    let oid = repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &[&head])?;
    debug!(commit = %oid, "committed");

    push_branch(repo, auth, branch)?;
    Ok(true)
}

/// Perform `git push origin <branch>`.
///
/// # Errors
/// Returns an error if the push fails or the remote rejects the ref update.
pub fn push_branch(repo: &Repository, auth: &SshAuth, branch: &str) -> Result<()> {
    info!(branch, "pushing branch");
    let refspec = format!("refs/heads/{0}:refs/heads/{0}", branch);
    let mut rejected: Option<String> = None;
    {
        let mut cb = callbacks_with_key(auth);
        cb.push_update_reference(|refname, status| {
            if let Some(msg) = status {
                rejected = Some(format!("{}: {}", refname, msg));
            }
            Ok(())
        });
        let mut po = PushOptions::new();
        po.remote_callbacks(cb);

        let mut remote = repo.find_remote("origin")?;
        remote
            .push(&[refspec.as_str()], Some(&mut po))
            .with_context(|| format!("git push origin {}", branch))?;
    }
    if let Some(reason) = rejected {
        bail!("push rejected by remote ({})", reason);
    }
    Ok(())
}
