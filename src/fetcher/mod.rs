pub mod guard;

use std::sync::Arc;

use thiserror::Error;

use crate::backend::{BackendError, LeadSource};
use crate::query::{
    FetchResult, LeadQuery, Ordering, Predicate, SelectRequest, Source, COL_TRIAGED_AT,
};

pub use guard::{RequestToken, RequestTracker};

pub const DEFAULT_VIEW: &str = "leads_triaged";
pub const DEFAULT_TABLE: &str = "leads";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("primary view query failed: {primary}; fallback table query failed: {fallback}")]
    BothFailed {
        primary: BackendError,
        fallback: BackendError,
    },
}

/// Names of the two resources a fetch may read from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resources {
    pub view: String,
    pub table: String,
}

impl Default for Resources {
    fn default() -> Self {
        Self {
            view: DEFAULT_VIEW.to_string(),
            table: DEFAULT_TABLE.to_string(),
        }
    }
}

/// Resolves one page of leads, preferring the triaged view and falling back to the
/// base table when the view query errors.
///
/// Holds no per-request state; clones share the same source and may run concurrently.
#[derive(Clone)]
pub struct LeadFetcher {
    source: Arc<dyn LeadSource>,
    resources: Resources,
}

impl LeadFetcher {
    pub fn new(source: Arc<dyn LeadSource>, resources: Resources) -> Self {
        Self { source, resources }
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    pub fn primary_request(&self, query: &LeadQuery) -> SelectRequest {
        SelectRequest {
            resource: self.resources.view.clone(),
            predicates: query.predicates(),
            order: Ordering::TRIAGED_DESC,
            range: query.range(),
        }
    }

    /// Same window and filters against the table, restricted to triaged rows. This only
    /// approximates the view, which may apply further rules of its own.
    pub fn fallback_request(&self, query: &LeadQuery) -> SelectRequest {
        let mut predicates = query.predicates();
        predicates.push(Predicate::NotNull {
            column: COL_TRIAGED_AT,
        });
        SelectRequest {
            resource: self.resources.table.clone(),
            predicates,
            order: Ordering::TRIAGED_DESC,
            range: query.range(),
        }
    }

    pub async fn fetch(&self, query: &LeadQuery) -> Result<FetchResult, FetchError> {
        let primary = self.primary_request(query);
        tracing::debug!(
            resource = %primary.resource,
            page = query.page,
            range = %primary.range.header_value(),
            "querying primary view"
        );
        let primary_err = match self.source.select(&primary).await {
            Ok(page) => {
                return Ok(FetchResult {
                    rows: page.rows,
                    total_count: page.total_count,
                    source: Source::PrimaryView,
                })
            }
            Err(e) => e,
        };

        tracing::warn!(
            resource = %primary.resource,
            error = %primary_err,
            "primary view query failed, falling back to base table"
        );
        let fallback = self.fallback_request(query);
        match self.source.select(&fallback).await {
            Ok(page) => Ok(FetchResult {
                rows: page.rows,
                total_count: page.total_count,
                source: Source::FallbackTable,
            }),
            Err(fallback_err) => {
                tracing::warn!(
                    resource = %fallback.resource,
                    error = %fallback_err,
                    "fallback table query failed"
                );
                Err(FetchError::BothFailed {
                    primary: primary_err,
                    fallback: fallback_err,
                })
            }
        }
    }
}
