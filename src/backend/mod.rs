pub mod null;
pub mod rest;

use async_trait::async_trait;
use thiserror::Error;

use crate::query::{Page, SelectRequest};

pub use null::NullBackend;
pub use rest::{RestBackend, RestOptions};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request to {resource} failed: {source}")]
    Transport {
        resource: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{resource} returned HTTP {status}: {message}")]
    Status {
        resource: String,
        status: u16,
        message: String,
    },

    #[error("failed to decode rows from {resource}: {source}")]
    Decode {
        resource: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid content-range from {resource}: '{value}'")]
    ContentRange { resource: String, value: String },

    #[error("invalid service URL: {url}")]
    InvalidUrl { url: String },

    #[error("invalid anon key header value")]
    InvalidKey,

    #[error("failed to build HTTP client: {source}")]
    HttpClientBuild {
        #[source]
        source: reqwest::Error,
    },
}

/// A queryable store of lead rows.
///
/// One call is one remote attempt. Implementations do not retry or cache, and must be
/// safe to call from several tasks at once.
#[async_trait]
pub trait LeadSource: Send + Sync {
    async fn select(&self, request: &SelectRequest) -> Result<Page, BackendError>;

    fn name(&self) -> &str;
}
