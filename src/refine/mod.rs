use std::cmp::Ordering;

use crate::model::LeadRecord;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortKey {
    Score,
    #[default]
    TriagedAt,
}

impl SortKey {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "score" | "lead_score" => Some(Self::Score),
            "time" | "triaged" | "triaged_at" => Some(Self::TriagedAt),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortKey::Score => "score",
            SortKey::TriagedAt => "triaged_at",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

impl SortDirection {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "asc" | "ascending" => Some(Self::Ascending),
            "desc" | "descending" => Some(Self::Descending),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        }
    }
}

/// Text a search term is matched against: title, publisher, reasons, people and
/// status, space separated.
pub fn haystack(row: &LeadRecord) -> String {
    let mut parts: Vec<String> = vec![
        row.title.clone().unwrap_or_default(),
        row.publisher_domain.clone().unwrap_or_default(),
        row.triage_reasons
            .as_ref()
            .map(|r| r.join(" "))
            .unwrap_or_default(),
        row.people.as_ref().map(|p| p.join(" ")).unwrap_or_default(),
    ];
    if let Some(status) = row.status.as_ref() {
        parts.push(status.as_str().to_string());
    }
    parts.join(" ").to_lowercase()
}

/// Rows of the current page containing `term`, case-insensitively. A blank term keeps
/// every row in its original order.
pub fn search(rows: &[LeadRecord], term: &str) -> Vec<LeadRecord> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return rows.to_vec();
    }
    rows.iter()
        .filter(|r| haystack(r).contains(&needle))
        .cloned()
        .collect()
}

fn score_key(row: &LeadRecord) -> f64 {
    row.lead_score.unwrap_or(f64::NEG_INFINITY)
}

/// Stable in-place sort. Missing scores and timestamps compare below every present value.
pub fn sort(rows: &mut [LeadRecord], key: SortKey, direction: SortDirection) {
    rows.sort_by(|a, b| {
        let ord = match key {
            SortKey::Score => score_key(a)
                .partial_cmp(&score_key(b))
                .unwrap_or(Ordering::Equal),
            SortKey::TriagedAt => a.triaged_at.cmp(&b.triaged_at),
        };
        match direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    });
}

/// Search then sort, the way the displayed rows are derived from the fetched page.
pub fn refine(
    rows: &[LeadRecord],
    term: &str,
    key: SortKey,
    direction: SortDirection,
) -> Vec<LeadRecord> {
    let mut out = search(rows, term);
    sort(&mut out, key, direction);
    out
}
