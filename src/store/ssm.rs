use anyhow::{Context, Result};
use aws_sdk_ssm::Client;
use aws_sdk_ssm::types::ParameterType as SsmParameterType;
use tokio::runtime::Runtime;
use tracing::debug;

use super::{ParameterStore, ParameterType};
use crate::aws::{blocking_runtime, load_sdk_config};

/// [`ParameterStore`] backed by AWS Systems Manager Parameter Store.
pub struct SsmParameterStore {
    runtime: Runtime,
    client: Client,
}

impl SsmParameterStore {
    /// Build a client from the default credential chain.
    pub fn new(region: Option<&str>) -> Result<Self> {
        let runtime = blocking_runtime()?;
        let sdk_config = load_sdk_config(&runtime, region);
        let client = Client::new(&sdk_config);
        Ok(Self { runtime, client })
    }

    /// Build a client from an explicit service config (custom endpoints, static credentials).
    pub fn from_conf(conf: aws_sdk_ssm::Config) -> Result<Self> {
        Ok(Self {
            runtime: blocking_runtime()?,
            client: Client::from_conf(conf),
        })
    }
}

impl From<ParameterType> for SsmParameterType {
    fn from(kind: ParameterType) -> Self {
        match kind {
            ParameterType::String => SsmParameterType::String,
            ParameterType::SecureString => SsmParameterType::SecureString,
        }
    }
}

impl ParameterStore for SsmParameterStore {
    fn put_parameter(&self, name: &str, value: &str, kind: ParameterType) -> Result<()> {
        self.runtime
            .block_on(
                self.client
                    .put_parameter()
                    .name(name)
                    .value(value)
                    .r#type(kind.into())
                    .overwrite(true)
                    .send(),
            )
            .with_context(|| format!("ssm put-parameter {}", name))?;
        debug!(parameter = %name, "parameter stored");
        Ok(())
    }

    fn get_parameter(&self, name: &str) -> Result<Option<String>> {
        let res = self.runtime.block_on(
            self.client
                .get_parameter()
                .name(name)
                .with_decryption(true)
                .send(),
        );
        match res {
            Ok(out) => Ok(out
                .parameter()
                .and_then(|p| p.value())
                .map(str::to_string)),
            Err(e)
                if e
                    .as_service_error()
                    .is_some_and(|se| se.is_parameter_not_found()) =>
            {
                Ok(None)
            }
            Err(e) => Err(e).with_context(|| format!("ssm get-parameter {}", name)),
        }
    }
}
