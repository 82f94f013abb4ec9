//! Source formatting applied before files are written into the working tree.

use std::ffi::OsStr;
use std::io::{self, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;

use anyhow::Result;

use crate::error::FormatError;

/// A code-style formatter for one family of source files.
pub trait Formatter {
    /// Whether `path` is a file this formatter understands.
    fn recognizes(&self, path: &Path) -> bool;

    /// Return the canonical rendering of `source`.
    fn format(&self, source: &str) -> Result<String>;
}

/// Formatter that pipes source through an external program (stdin → stdout).
#[derive(Debug, Clone)]
pub struct CommandFormatter {
    program: String,
    args: Vec<String>,
    extensions: Vec<String>,
}

impl CommandFormatter {
    pub fn new<P, A, E>(program: P, args: A, extensions: E) -> Self
    where
        P: Into<String>,
        A: IntoIterator,
        A::Item: Into<String>,
        E: IntoIterator,
        E::Item: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            extensions: extensions.into_iter().map(Into::into).collect(),
        }
    }

    /// `black` with its default style, for Python sources.
    pub fn black() -> Self {
        Self::new("black", ["--quiet", "-"], ["py", "pyi"])
    }
}

impl Formatter for CommandFormatter {
    fn recognizes(&self, path: &Path) -> bool {
        path.extension()
            .and_then(OsStr::to_str)
            .is_some_and(|ext| self.extensions.iter().any(|e| e == ext))
    }

    fn format(&self, source: &str) -> Result<String> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| FormatError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // Feed stdin from its own thread while the child's output is drained,
        // otherwise a large file fills both pipes and neither side moves.
        let stdin = child.stdin.take();
        let (written, out) = thread::scope(|s| {
            let writer = s.spawn(move || match stdin {
                Some(mut stdin) => stdin.write_all(source.as_bytes()),
                None => Ok(()),
            });
            let out = child.wait_with_output();
            let written = writer
                .join()
                .unwrap_or_else(|_| Err(io::Error::other("stdin writer panicked")));
            (written, out)
        });
        let out = out?;

        let stderr = String::from_utf8_lossy(&out.stderr).trim().to_string();
        if !out.status.success() {
            return Err(FormatError::Failed {
                program: self.program.clone(),
                status: out.status,
                stderr,
            }
            .into());
        }
        // The child exited cleanly without reading all of its input.
        if let Err(e) = written {
            return Err(FormatError::Failed {
                program: self.program.clone(),
                status: out.status,
                stderr: if stderr.is_empty() { e.to_string() } else { stderr },
            }
            .into());
        }
        String::from_utf8(out.stdout).map_err(|_| {
            FormatError::Utf8 {
                program: self.program.clone(),
            }
            .into()
        })
    }
}
