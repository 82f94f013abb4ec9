//! Parameter-store abstraction.
//!
//! The collector only needs "put one value" and the publish flow only needs
//! "get one value", so the trait stays that small. [`SsmParameterStore`] binds
//! it to AWS Systems Manager.

mod ssm;

use anyhow::Result;
use tracing::{error, info};

pub use ssm::SsmParameterStore;

/// Storage type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterType {
    String,
    SecureString,
}

impl ParameterType {
    /// Keys naming credentials (anything containing `key`) are stored encrypted.
    pub fn for_key(key: &str) -> Self {
        if key.contains("key") {
            ParameterType::SecureString
        } else {
            ParameterType::String
        }
    }
}

/// A hierarchical key-value store that can hold encrypted values.
pub trait ParameterStore {
    /// Create or overwrite the parameter `name`.
    fn put_parameter(&self, name: &str, value: &str, kind: ParameterType) -> Result<()>;

    /// Read `name`, decrypting it if needed. `Ok(None)` when it does not exist.
    fn get_parameter(&self, name: &str) -> Result<Option<String>>;
}

/// Result of a best-effort [`persist_parameters`] run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PersistReport {
    pub written: Vec<String>,
    pub failed: Vec<String>,
}

/// Write every non-empty `(key, value)` pair under `prefix`.
///
/// `prefix` must already be sanitized. A failing write is logged and skipped;
/// the remaining parameters are still attempted.
pub fn persist_parameters<S>(store: &S, prefix: &str, params: &[(String, String)]) -> PersistReport
where
    S: ParameterStore + ?Sized,
{
    let mut report = PersistReport::default();
    for (key, value) in params {
        if value.is_empty() {
            continue;
        }
        let name = format!("{}{}", prefix, key);
        info!(parameter = %name, "putting parameter");
        match store.put_parameter(&name, value, ParameterType::for_key(key)) {
            Ok(()) => report.written.push(name),
            Err(e) => {
                error!(parameter = %name, error = %format!("{:#}", e), "failed to put parameter");
                report.failed.push(name);
            }
        }
    }
    report
}
