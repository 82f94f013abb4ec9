//! Writing new file contents into a working tree.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::info;

use crate::error::ValidationError;
use crate::format::Formatter;

/// A file to (over)write, relative to the working-tree root.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceFile {
    pub filename: String,
    pub contents: String,
}

impl SourceFile {
    pub fn new(filename: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            contents: contents.into(),
        }
    }
}

/// Resolve `filename` under `root`, refusing absolute paths, `..` and `.git`.
fn target_path(root: &Path, filename: &str) -> Result<PathBuf, ValidationError> {
    let rel = Path::new(filename);
    let escapes = rel.components().any(|c| match c {
        Component::ParentDir | Component::RootDir | Component::Prefix(_) => true,
        // The repository's own metadata (hooks, config) is off limits.
        Component::Normal(name) => name.eq_ignore_ascii_case(".git"),
        Component::CurDir => false,
    });
    if filename.is_empty() || escapes {
        return Err(ValidationError::SourcePath {
            path: filename.to_string(),
        });
    }
    Ok(root.join(rel))
}

/// Overwrite files in the working tree at `root`.
///
/// Files are written in input order, so a later entry wins over an earlier one
/// with the same name. When a `formatter` is given, files it recognizes are
/// reformatted first; a formatting failure aborts the update.
///
/// # Errors
/// - [`ValidationError::SourcePath`] for paths outside `root` or inside `.git` (checked up front).
/// - Formatter and I/O errors.
pub fn update_source_code(
    files: &[SourceFile],
    root: &Path,
    formatter: Option<&dyn Formatter>,
) -> Result<()> {
    info!(root = %root.display(), files = files.len(), "updating source code");

    let targets = files
        .iter()
        .map(|f| target_path(root, &f.filename))
        .collect::<Result<Vec<_>, _>>()?;

    for (file, path) in files.iter().zip(&targets) {
        let contents = match formatter {
            Some(fmt) if fmt.recognizes(path) => fmt
                .format(&file.contents)
                .with_context(|| format!("failed to format {}", file.filename))?,
            _ => file.contents.clone(),
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        info!(file = %file.filename, "writing");
        fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))?;
    }
    Ok(())
}

/// Write an SSH private key where the clone step can read it.
///
/// The file is created with mode `0600` (ssh refuses looser keys) and always
/// ends with a newline.
pub fn write_private_key(path: &Path, key: &str) -> Result<()> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut f = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
        .with_context(|| format!("failed to create key file {}", path.display()))?;
    // mode() only applies on creation
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;

    f.write_all(key.as_bytes())?;
    if !key.ends_with('\n') {
        f.write_all(b"\n")?;
    }
    Ok(())
}
