use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Injury severity assigned upstream by triage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum Severity {
    Fatal,
    SeriousInjury,
    Injury,
    Unknown,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Fatal,
        Severity::SeriousInjury,
        Severity::Injury,
        Severity::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Fatal => "fatal",
            Severity::SeriousInjury => "serious_injury",
            Severity::Injury => "injury",
            Severity::Unknown => "unknown",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.as_str() == value.trim().to_lowercase())
    }
}

impl From<String> for Severity {
    fn from(value: String) -> Self {
        Self::parse(&value).unwrap_or(Severity::Unknown)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum CaseType {
    Truck,
    Pedestrian,
    Auto,
    Motorcycle,
    Unknown,
}

impl CaseType {
    pub const ALL: [CaseType; 5] = [
        CaseType::Truck,
        CaseType::Pedestrian,
        CaseType::Auto,
        CaseType::Motorcycle,
        CaseType::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CaseType::Truck => "truck",
            CaseType::Pedestrian => "pedestrian",
            CaseType::Auto => "auto",
            CaseType::Motorcycle => "motorcycle",
            CaseType::Unknown => "unknown",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == value.trim().to_lowercase())
    }
}

impl From<String> for CaseType {
    fn from(value: String) -> Self {
        Self::parse(&value).unwrap_or(CaseType::Unknown)
    }
}

/// Workflow state. Mutated by other tools, so values this crate does not know
/// about are carried through as `Other`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum LeadStatus {
    New,
    Reviewing,
    Contacted,
    Done,
    Closed,
    Ignore,
    Other(String),
}

impl LeadStatus {
    pub const KNOWN: [LeadStatus; 6] = [
        LeadStatus::New,
        LeadStatus::Reviewing,
        LeadStatus::Contacted,
        LeadStatus::Done,
        LeadStatus::Closed,
        LeadStatus::Ignore,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Reviewing => "reviewing",
            LeadStatus::Contacted => "contacted",
            LeadStatus::Done => "done",
            LeadStatus::Closed => "closed",
            LeadStatus::Ignore => "ignore",
            LeadStatus::Other(raw) => raw.as_str(),
        }
    }

    /// Strict parse used for filter selectors; `Other` is never produced.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().to_lowercase();
        Self::KNOWN.into_iter().find(|s| s.as_str() == value)
    }
}

impl From<String> for LeadStatus {
    fn from(value: String) -> Self {
        Self::parse(&value).unwrap_or(LeadStatus::Other(value))
    }
}

impl Serialize for LeadStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for CaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One triaged lead as the query service returns it. Never mutated here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeadRecord {
    pub id: serde_json::Value,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub publisher_domain: Option<String>,
    #[serde(default)]
    pub people: Option<Vec<String>>,
    #[serde(default)]
    pub severity: Option<Severity>,
    #[serde(default)]
    pub case_type: Option<CaseType>,
    #[serde(default)]
    pub lead_score: Option<f64>,
    #[serde(default)]
    pub triage_reasons: Option<Vec<String>>,
    #[serde(default)]
    pub triaged_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ingested_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<LeadStatus>,
}

impl LeadRecord {
    /// Row identity as display text. String ids are shown without quotes.
    pub fn id_text(&self) -> String {
        match &self.id {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// `all` or one exact value for a categorical filter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selector<T> {
    All,
    Only(T),
}

impl<T> Selector<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Selector::All => None,
            Selector::Only(v) => Some(v),
        }
    }

    /// Parses `all` (or an empty string) as no filter, anything else through `parse`.
    pub fn parse_with(value: &str, parse: impl Fn(&str) -> Option<T>) -> Option<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            return Some(Selector::All);
        }
        parse(trimmed).map(Selector::Only)
    }
}

impl Selector<Severity> {
    pub fn parse(value: &str) -> Option<Self> {
        Self::parse_with(value, Severity::parse)
    }
}

impl Selector<CaseType> {
    pub fn parse(value: &str) -> Option<Self> {
        Self::parse_with(value, CaseType::parse)
    }
}

impl Selector<LeadStatus> {
    pub fn parse(value: &str) -> Option<Self> {
        Self::parse_with(value, LeadStatus::parse)
    }
}

impl<T: fmt::Display> fmt::Display for Selector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::All => f.write_str("all"),
            Selector::Only(v) => v.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_decodes_with_missing_fields() {
        let raw = r#"{"id": 7, "title": "Crash on I-5", "lead_score": 82.5}"#;
        let rec: LeadRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(rec.id_text(), "7");
        assert_eq!(rec.lead_score, Some(82.5));
        assert!(rec.triaged_at.is_none());
        assert!(rec.people.is_none());
    }

    #[test]
    fn record_decodes_enums_and_timestamps() {
        let raw = r#"{
            "id": "a1",
            "severity": "serious_injury",
            "case_type": "motorcycle",
            "status": "reviewing",
            "triaged_at": "2024-05-01T10:00:00+00:00",
            "people": ["Jane Doe"]
        }"#;
        let rec: LeadRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(rec.id_text(), "a1");
        assert_eq!(rec.severity, Some(Severity::SeriousInjury));
        assert_eq!(rec.case_type, Some(CaseType::Motorcycle));
        assert_eq!(rec.status, Some(LeadStatus::Reviewing));
        assert!(rec.triaged_at.is_some());
    }

    #[test]
    fn unrecognised_values_do_not_fail_the_row() {
        let raw = r#"{"id": 1, "severity": "minor", "case_type": "bicycle", "status": "archived"}"#;
        let rec: LeadRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(rec.severity, Some(Severity::Unknown));
        assert_eq!(rec.case_type, Some(CaseType::Unknown));
        assert_eq!(rec.status, Some(LeadStatus::Other("archived".to_string())));
        let back = serde_json::to_value(&rec).unwrap();
        assert_eq!(back["status"], "archived");
    }

    #[test]
    fn selectors_parse_all_and_exact_values() {
        assert_eq!(Selector::<Severity>::parse("all"), Some(Selector::All));
        assert_eq!(Selector::<Severity>::parse("ALL"), Some(Selector::All));
        assert_eq!(
            Selector::<Severity>::parse("fatal"),
            Some(Selector::Only(Severity::Fatal))
        );
        assert_eq!(
            Selector::<CaseType>::parse("Truck"),
            Some(Selector::Only(CaseType::Truck))
        );
        assert_eq!(Selector::<LeadStatus>::parse("archived"), None);
        assert_eq!(Selector::<Severity>::parse("bad"), None);
    }
}
