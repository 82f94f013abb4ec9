//! Shared plumbing for the AWS SDK clients.
//!
//! The SDK is async-only while the rest of the crate is blocking, so each client
//! wrapper owns a current-thread runtime and drives calls with `block_on`.

use anyhow::{Context, Result};
use aws_config::{BehaviorVersion, Region, SdkConfig};
use tokio::runtime::{Builder, Runtime};

pub fn blocking_runtime() -> Result<Runtime> {
    Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start AWS runtime")
}

/// Resolve credentials and region from the default provider chain.
///
/// An explicit `region` wins over `AWS_REGION` and the shared config files.
pub fn load_sdk_config(runtime: &Runtime, region: Option<&str>) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(r) = region {
        loader = loader.region(Region::new(r.to_string()));
    }
    runtime.block_on(loader.load())
}
