use serde::Serialize;

use crate::model::LeadRecord;
use crate::query::Source;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" | "table" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Machine-readable form of one displayed page.
#[derive(Clone, Debug, Serialize)]
pub struct PageReport<'a> {
    pub page: u64,
    pub total_pages: u64,
    pub total_count: u64,
    pub source: Option<Source>,
    pub error: Option<&'a str>,
    pub rows: &'a [LeadRecord],
}

pub fn render_json(report: &PageReport<'_>) -> Vec<u8> {
    let mut out = serde_json::to_vec_pretty(report).unwrap_or_else(|_| b"{}".to_vec());
    out.push(b'\n');
    out
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let mut out: String = value.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn score_text(score: Option<f64>) -> String {
    match score {
        Some(s) if s.fract() == 0.0 => format!("{s:.0}"),
        Some(s) => format!("{s:.1}"),
        None => "-".to_string(),
    }
}

fn row_line(r: &LeadRecord) -> String {
    format!(
        "{:<10} {:>5} {:<14} {:<10} {:<9} {:<16} {}",
        truncate(&r.id_text(), 10),
        score_text(r.lead_score),
        opt(r.severity),
        opt(r.case_type),
        truncate(&opt(r.status.as_ref()), 9),
        opt(r.triaged_at.map(|t| t.format("%Y-%m-%d %H:%M"))),
        truncate(r.title.as_deref().unwrap_or("(untitled)"), 60),
    )
}

/// Fixed-width table of rows, with the detail block under the expanded row.
pub fn render_table(rows: &[LeadRecord], expanded: Option<&str>) -> String {
    let mut out = format!(
        "{:<10} {:>5} {:<14} {:<10} {:<9} {:<16} {}\n",
        "ID", "SCORE", "SEVERITY", "CASE", "STATUS", "TRIAGED", "TITLE"
    );
    if rows.is_empty() {
        out.push_str("(no leads)\n");
        return out;
    }
    for r in rows {
        out.push_str(&row_line(r));
        out.push('\n');
        if expanded.is_some_and(|id| id == r.id_text()) {
            out.push_str(&render_detail(r));
        }
    }
    out
}

pub fn render_detail(r: &LeadRecord) -> String {
    let mut out = String::new();
    let mut field = |label: &str, value: String| {
        out.push_str(&format!("    {:<10}: {}\n", label, value));
    };
    field("url", opt(r.url.as_deref()));
    field("publisher", opt(r.publisher_domain.as_deref()));
    field(
        "people",
        r.people
            .as_ref()
            .filter(|p| !p.is_empty())
            .map(|p| p.join(", "))
            .unwrap_or_else(|| "-".to_string()),
    );
    field("ingested", opt(r.ingested_at.map(|t| t.to_rfc3339())));
    field("triaged", opt(r.triaged_at.map(|t| t.to_rfc3339())));
    match r.triage_reasons.as_ref().filter(|v| !v.is_empty()) {
        Some(reasons) => {
            out.push_str("    reasons   :\n");
            for reason in reasons {
                out.push_str(&format!("      - {reason}\n"));
            }
        }
        None => out.push_str("    reasons   : -\n"),
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lead(value: serde_json::Value) -> LeadRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn table_lists_rows_and_expands_one() {
        let rows = vec![
            lead(serde_json::json!({
                "id": 1,
                "title": "Truck crash on Route 9",
                "lead_score": 88,
                "severity": "fatal",
                "case_type": "truck",
                "triage_reasons": ["fatality reported", "commercial vehicle"],
                "people": ["Ann Lee"],
                "url": "https://news.example/a"
            })),
            lead(serde_json::json!({"id": 2, "lead_score": 41.25})),
        ];
        let out = render_table(&rows, Some("1"));
        assert!(out.starts_with("ID"));
        assert!(out.contains("Truck crash on Route 9"));
        assert!(out.contains("fatal"));
        assert!(out.contains("41.2") || out.contains("41.3"));
        assert!(out.contains("(untitled)"));
        assert!(out.contains("https://news.example/a"));
        assert!(out.contains("- commercial vehicle"));
        assert_eq!(out.matches("reasons").count(), 1);
    }

    #[test]
    fn empty_page_says_so() {
        assert!(render_table(&[], None).contains("(no leads)"));
    }

    #[test]
    fn long_titles_are_truncated() {
        assert_eq!(truncate("abcdef", 4), "abc…");
        assert_eq!(truncate("abc", 4), "abc");
    }

    #[test]
    fn json_report_tags_the_source() {
        let rows = vec![lead(serde_json::json!({"id": "x"}))];
        let report = PageReport {
            page: 1,
            total_pages: 1,
            total_count: 1,
            source: Some(Source::FallbackTable),
            error: None,
            rows: &rows,
        };
        let v: serde_json::Value = serde_json::from_slice(&render_json(&report)).unwrap();
        assert_eq!(v["source"], "fallback-table");
        assert_eq!(v["rows"][0]["id"], "x");
    }

    #[test]
    fn formats_parse() {
        assert_eq!(OutputFormat::parse("JSON"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse("table"), Some(OutputFormat::Text));
        assert_eq!(OutputFormat::parse("xml"), None);
    }
}
