//! Pull-request providers.
//!
//! Provides the [`GitProvider`] trait that hides the hosted git service's API
//! from the publish flow. Each service gets its own implementation; callers
//! only ever see the trait.

mod codecommit;

use anyhow::Result;
use tracing::{error, info};

pub use codecommit::CodeCommitProvider;

/// Every pull request targets this ref.
pub const DESTINATION_REF: &str = "refs/heads/main";

/// Abstraction over a hosted git service's pull-request API.
pub trait GitProvider {
    /// Open a pull request from `branch` into [`DESTINATION_REF`].
    ///
    /// Returns the provider-assigned id. `Ok(None)` means the service answered
    /// but the answer carried no id; that case is logged, not raised.
    fn create_pull_request(
        &self,
        branch: &str,
        title: &str,
        description: &str,
    ) -> Result<Option<String>>;
}

/// Log the outcome of a create call and pass the id through.
pub(crate) fn report_created(id: Option<String>) -> Option<String> {
    match &id {
        Some(id) => info!(pull_request_id = %id, "pull request created"),
        None => error!("failed to create pull request: response has no pull request id"),
    }
    id
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_passes_id_through() {
        let (id, text) = logs::capture(|| report_created(Some("17".into())));
        assert_eq!(id.as_deref(), Some("17"));
        assert!(text.contains("INFO"));
        assert!(text.contains("pull_request_id=17"));
    }

    #[test]
    fn missing_id_is_logged_as_error() {
        let (id, text) = logs::capture(|| report_created(None));
        assert_eq!(id, None);
        assert!(text.contains("ERROR"), "{}", text);
        assert!(text.contains("failed to create pull request"), "{}", text);
    }
}
