use async_trait::async_trait;

use super::{BackendError, LeadSource};
use crate::query::{Page, SelectRequest};

/// Stand-in used when no service credentials are configured: every query is an
/// empty page with a zero count, never an error.
#[derive(Clone, Debug, Default)]
pub struct NullBackend;

#[async_trait]
impl LeadSource for NullBackend {
    async fn select(&self, _request: &SelectRequest) -> Result<Page, BackendError> {
        Ok(Page::default())
    }

    fn name(&self) -> &str {
        "null"
    }
}
