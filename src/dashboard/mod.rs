pub mod command;

use std::time::Duration;

use thiserror::Error;

use crate::fetcher::{FetchError, RequestToken, RequestTracker};
use crate::model::{CaseType, LeadRecord, LeadStatus, Selector, Severity};
use crate::query::{FetchResult, LeadQuery, Source};
use crate::refine::{self, SortDirection, SortKey};

pub use command::Command;

/// Interval between automatic refreshes while auto-refresh is on.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(15);

/// Optional parts of the dashboard, switched per deployment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Features {
    pub status_filter: bool,
    pub row_expansion: bool,
    pub search_debounce: Option<Duration>,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            status_filter: true,
            row_expansion: true,
            search_debounce: None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DashboardError {
    #[error("{feature} is disabled for this dashboard")]
    FeatureDisabled { feature: &'static str },

    #[error("no row with id '{id}' on this page")]
    UnknownRow { id: String },
}

#[derive(Clone, Debug, PartialEq)]
pub enum FilterChange {
    MinScore(f64),
    Severity(Selector<Severity>),
    CaseType(Selector<CaseType>),
    Status(Selector<LeadStatus>),
}

/// Everything the monitor displays. Fetched rows are replaced wholesale by each applied
/// result; search, sort and expansion are derived locally and never fetch.
#[derive(Debug)]
pub struct Dashboard {
    features: Features,
    query: LeadQuery,
    search: String,
    sort_key: SortKey,
    sort_direction: SortDirection,
    rows: Vec<LeadRecord>,
    total_count: u64,
    source: Option<Source>,
    error: Option<String>,
    expanded: Option<String>,
    auto_refresh: bool,
    loading: bool,
    tracker: RequestTracker,
}

impl Dashboard {
    pub fn new(features: Features, mut query: LeadQuery) -> Self {
        if !features.status_filter {
            query.status = Selector::All;
        }
        query.page = query.page.clamp(1, crate::query::MAX_PAGE);
        Self {
            features,
            query,
            search: String::new(),
            sort_key: SortKey::default(),
            sort_direction: SortDirection::default(),
            rows: Vec::new(),
            total_count: 0,
            source: None,
            error: None,
            expanded: None,
            auto_refresh: false,
            loading: false,
            tracker: RequestTracker::new(),
        }
    }

    pub fn features(&self) -> Features {
        self.features
    }

    pub fn query(&self) -> &LeadQuery {
        &self.query
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn source(&self) -> Option<Source> {
        self.source
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn sort(&self) -> (SortKey, SortDirection) {
        (self.sort_key, self.sort_direction)
    }

    pub fn expanded(&self) -> Option<&str> {
        self.expanded.as_deref()
    }

    pub fn auto_refresh(&self) -> bool {
        self.auto_refresh
    }

    pub fn set_auto_refresh(&mut self, enabled: bool) {
        self.auto_refresh = enabled;
    }

    pub fn total_pages(&self) -> u64 {
        self.total_count
            .div_ceil(crate::query::PAGE_SIZE)
            .max(1)
    }

    /// Applies a filter and moves back to page 1. The caller fetches afterwards.
    pub fn set_filter(&mut self, change: FilterChange) -> Result<(), DashboardError> {
        match change {
            FilterChange::MinScore(score) => self.query.min_score = score.max(0.0),
            FilterChange::Severity(sel) => self.query.severity = sel,
            FilterChange::CaseType(sel) => self.query.case_type = sel,
            FilterChange::Status(sel) => {
                if !self.features.status_filter {
                    return Err(DashboardError::FeatureDisabled {
                        feature: "status filter",
                    });
                }
                self.query.status = sel;
            }
        }
        self.query.page = 1;
        Ok(())
    }

    pub fn set_page(&mut self, page: u64) {
        self.query.page = page.clamp(1, crate::query::MAX_PAGE);
    }

    /// Moves forward one page. `false` when already on the last known page.
    pub fn next_page(&mut self) -> bool {
        if self.query.page >= self.total_pages().min(crate::query::MAX_PAGE) {
            return false;
        }
        self.query.page += 1;
        true
    }

    pub fn prev_page(&mut self) -> bool {
        if self.query.page <= 1 {
            return false;
        }
        self.query.page -= 1;
        true
    }

    pub fn set_search(&mut self, term: &str) {
        self.search = term.to_string();
    }

    pub fn set_sort(&mut self, key: SortKey, direction: SortDirection) {
        self.sort_key = key;
        self.sort_direction = direction;
    }

    pub fn toggle_expanded(&mut self, id: &str) -> Result<bool, DashboardError> {
        if !self.features.row_expansion {
            return Err(DashboardError::FeatureDisabled {
                feature: "row expansion",
            });
        }
        if self.expanded.as_deref() == Some(id) {
            self.expanded = None;
            return Ok(false);
        }
        if !self.rows.iter().any(|r| r.id_text() == id) {
            return Err(DashboardError::UnknownRow { id: id.to_string() });
        }
        self.expanded = Some(id.to_string());
        Ok(true)
    }

    pub fn expanded_row(&self) -> Option<&LeadRecord> {
        let id = self.expanded.as_deref()?;
        self.rows.iter().find(|r| r.id_text() == id)
    }

    /// Marks a fetch as issued for the current query and hands back what to fetch.
    pub fn begin_fetch(&mut self) -> (RequestToken, LeadQuery) {
        self.loading = true;
        (self.tracker.issue(), self.query.clone())
    }

    /// Applies a completed fetch unless a newer one was issued since. On failure the rows
    /// and count are cleared but filters stay as chosen.
    pub fn apply(&mut self, token: RequestToken, result: Result<FetchResult, FetchError>) -> bool {
        if !self.tracker.is_current(token) {
            tracing::debug!(token = token.value(), "discarding stale fetch result");
            return false;
        }
        self.loading = false;
        match result {
            Ok(fetched) => {
                self.rows = fetched.rows;
                self.total_count = fetched.total_count;
                self.source = Some(fetched.source);
                self.error = None;
            }
            Err(e) => {
                self.rows.clear();
                self.total_count = 0;
                self.source = None;
                self.error = Some(e.to_string());
            }
        }
        if self.expanded_row().is_none() {
            self.expanded = None;
        }
        true
    }

    pub fn rows(&self) -> &[LeadRecord] {
        &self.rows
    }

    /// Current page after search and sort.
    pub fn visible_rows(&self) -> Vec<LeadRecord> {
        refine::refine(
            &self.rows,
            &self.search,
            self.sort_key,
            self.sort_direction,
        )
    }
}
