//! # fixbot
//!
//! **fixbot** seeds the parameter store for the self-healing code pipeline and
//! publishes code fixes as CodeCommit pull requests.
//!
//! Features:
//! - `fixbot configure` prompts for the repository URL, SSH key and log group and stores them
//! - `fixbot publish <manifest>` rewrites files in the repository, pushes a branch and opens a pull request
//!
//! This CLI is built with [clap](https://docs.rs/clap).

use anyhow::Result;
use clap::{Parser, Subcommand};
use fixbot::{CollectorConfig, cmd_configure, cmd_publish};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Command-line interface definition.
#[derive(Parser, Debug)]
#[command(
    name = "fixbot",
    version,
    about = "fixbot - parameter store seeding and automated pull requests",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Cmd {
    /// Prompt for repository settings and store them in SSM Parameter Store
    Configure {
        /// Parameter store prefix (i.e. /self-healing-code/)
        #[arg(long, env = "PARAMETER_STORE_PREFIX")]
        prefix: String,
        /// AWS region of the parameter store
        #[arg(long, env = "AWS_REGION")]
        region: Option<String>,
        /// Give up after this many empty answers to one prompt
        #[arg(long, default_value_t = 5)]
        max_attempts: usize,
    },
    /// Rewrite files, push a branch and open a pull request
    Publish {
        /// Path to the publish manifest (TOML)
        manifest: PathBuf,
    },
}

/// CLI entry point.
///
/// Logs go to stderr, filtered by `RUST_LOG` (default `info`); prompts use stdout.
fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match cli.cmd {
        Cmd::Configure {
            prefix,
            region,
            max_attempts,
        } => cmd_configure(&CollectorConfig {
            prefix,
            region,
            max_attempts,
        }),
        Cmd::Publish { manifest } => cmd_publish(&manifest),
    }
}
