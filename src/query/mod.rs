use std::fmt;

use serde::Serialize;

use crate::model::{CaseType, LeadRecord, LeadStatus, Selector, Severity};

/// Rows per page. Fixed, callers only choose the page number.
pub const PAGE_SIZE: u64 = 50;

/// Highest page whose row window still fits in a `u64` offset.
pub const MAX_PAGE: u64 = u64::MAX / PAGE_SIZE;

pub const COL_LEAD_SCORE: &str = "lead_score";
pub const COL_SEVERITY: &str = "severity";
pub const COL_CASE_TYPE: &str = "case_type";
pub const COL_STATUS: &str = "status";
pub const COL_TRIAGED_AT: &str = "triaged_at";

/// Filter set plus 1-based page number, as chosen by the caller.
#[derive(Clone, Debug, PartialEq)]
pub struct LeadQuery {
    pub min_score: f64,
    pub severity: Selector<Severity>,
    pub case_type: Selector<CaseType>,
    pub status: Selector<LeadStatus>,
    pub page: u64,
}

impl Default for LeadQuery {
    fn default() -> Self {
        Self {
            min_score: 0.0,
            severity: Selector::All,
            case_type: Selector::All,
            status: Selector::All,
            page: 1,
        }
    }
}

impl LeadQuery {
    /// Inclusive row window for the requested page. Page 0 is treated as page 1 and
    /// pages past `MAX_PAGE` as `MAX_PAGE`.
    pub fn range(&self) -> RowRange {
        let skip = (self.page.clamp(1, MAX_PAGE) - 1).saturating_mul(PAGE_SIZE);
        RowRange {
            from: skip,
            to: skip.saturating_add(PAGE_SIZE - 1),
        }
    }

    /// Predicates shared by the view and the table. `all` and a zero score add nothing.
    pub fn predicates(&self) -> Vec<Predicate> {
        let mut out = Vec::new();
        if self.min_score > 0.0 {
            out.push(Predicate::Gte {
                column: COL_LEAD_SCORE,
                value: self.min_score,
            });
        }
        if let Some(sev) = self.severity.value() {
            out.push(Predicate::Eq {
                column: COL_SEVERITY,
                value: sev.as_str().to_string(),
            });
        }
        if let Some(case) = self.case_type.value() {
            out.push(Predicate::Eq {
                column: COL_CASE_TYPE,
                value: case.as_str().to_string(),
            });
        }
        if let Some(status) = self.status.value() {
            out.push(Predicate::Eq {
                column: COL_STATUS,
                value: status.as_str().to_string(),
            });
        }
        out
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RowRange {
    pub from: u64,
    pub to: u64,
}

impl RowRange {
    pub fn header_value(&self) -> String {
        format!("{}-{}", self.from, self.to)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    Gte { column: &'static str, value: f64 },
    Eq { column: &'static str, value: String },
    NotNull { column: &'static str },
}

impl Predicate {
    pub fn column(&self) -> &'static str {
        match self {
            Predicate::Gte { column, .. } => *column,
            Predicate::Eq { column, .. } => *column,
            Predicate::NotNull { column } => *column,
        }
    }

    /// Right-hand side of a query-string filter (`gte.70`, `eq.fatal`, `not.is.null`).
    pub fn operand(&self) -> String {
        match self {
            Predicate::Gte { value, .. } => format!("gte.{value}"),
            Predicate::Eq { value, .. } => format!("eq.{value}"),
            Predicate::NotNull { .. } => "not.is.null".to_string(),
        }
    }
}

/// Descending by triage time, rows without one last.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ordering {
    pub column: &'static str,
    pub descending: bool,
    pub nulls_last: bool,
}

impl Ordering {
    pub const TRIAGED_DESC: Ordering = Ordering {
        column: COL_TRIAGED_AT,
        descending: true,
        nulls_last: true,
    };

    pub fn param(&self) -> String {
        format!(
            "{}.{}.{}",
            self.column,
            if self.descending { "desc" } else { "asc" },
            if self.nulls_last {
                "nullslast"
            } else {
                "nullsfirst"
            }
        )
    }
}

/// Which backing resource answered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Source {
    #[serde(rename = "primary-view")]
    PrimaryView,
    #[serde(rename = "fallback-table")]
    FallbackTable,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::PrimaryView => "primary-view",
            Source::FallbackTable => "fallback-table",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One filtered, ordered, ranged and counted select against a named resource.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectRequest {
    pub resource: String,
    pub predicates: Vec<Predicate>,
    pub order: Ordering,
    pub range: RowRange,
}

impl SelectRequest {
    /// Query-string pairs in the service's filter dialect.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("select".to_string(), "*".to_string())];
        for p in self.predicates.iter() {
            pairs.push((p.column().to_string(), p.operand()));
        }
        pairs.push(("order".to_string(), self.order.param()));
        pairs
    }
}

/// Rows for one window plus the count of every row matching the filters.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Page {
    pub rows: Vec<LeadRecord>,
    pub total_count: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FetchResult {
    pub rows: Vec<LeadRecord>,
    pub total_count: u64,
    pub source: Source,
}
