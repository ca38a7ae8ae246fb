use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};

use crate::backend::{BackendError, LeadSource};
use crate::fetcher::{FetchError, LeadFetcher, Resources};
use crate::model::{CaseType, LeadRecord, LeadStatus, Selector, Severity};
use crate::query::{LeadQuery, Page, Predicate, SelectRequest, Source};
use crate::refine::{self, SortDirection, SortKey};

/// In-memory stand-in for the query service. Resources listed in `failing` answer
/// with an error; every request is recorded.
#[derive(Default)]
struct MemorySource {
    resources: HashMap<String, Vec<LeadRecord>>,
    failing: HashMap<String, String>,
    calls: Mutex<Vec<SelectRequest>>,
}

impl MemorySource {
    fn with_resource(mut self, name: &str, rows: Vec<LeadRecord>) -> Self {
        self.resources.insert(name.to_string(), rows);
        self
    }

    fn failing(mut self, name: &str, message: &str) -> Self {
        self.failing.insert(name.to_string(), message.to_string());
        self
    }

    fn calls(&self) -> Vec<SelectRequest> {
        self.calls.lock().unwrap().clone()
    }
}

fn matches(row: &LeadRecord, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::Gte { column, value } => {
            assert_eq!(*column, "lead_score");
            row.lead_score.is_some_and(|s| s >= *value)
        }
        Predicate::Eq { column, value } => {
            let actual = match *column {
                "severity" => row.severity.map(|s| s.as_str().to_string()),
                "case_type" => row.case_type.map(|c| c.as_str().to_string()),
                "status" => row.status.as_ref().map(|s| s.as_str().to_string()),
                other => panic!("unexpected column {other}"),
            };
            actual.as_deref() == Some(value.as_str())
        }
        Predicate::NotNull { column } => {
            assert_eq!(*column, "triaged_at");
            row.triaged_at.is_some()
        }
    }
}

#[async_trait]
impl LeadSource for MemorySource {
    async fn select(&self, request: &SelectRequest) -> Result<Page, BackendError> {
        self.calls.lock().unwrap().push(request.clone());
        if let Some(message) = self.failing.get(&request.resource) {
            return Err(BackendError::Status {
                resource: request.resource.clone(),
                status: 404,
                message: message.clone(),
            });
        }
        let rows = self
            .resources
            .get(&request.resource)
            .ok_or_else(|| BackendError::Status {
                resource: request.resource.clone(),
                status: 404,
                message: "relation does not exist".to_string(),
            })?;
        let mut filtered: Vec<LeadRecord> = rows
            .iter()
            .filter(|r| request.predicates.iter().all(|p| matches(r, p)))
            .cloned()
            .collect();
        refine::sort(&mut filtered, SortKey::TriagedAt, SortDirection::Descending);
        let total_count = filtered.len() as u64;
        let rows = filtered
            .into_iter()
            .skip(request.range.from as usize)
            .take((request.range.to - request.range.from + 1) as usize)
            .collect();
        Ok(Page { rows, total_count })
    }

    fn name(&self) -> &str {
        "memory"
    }
}

fn lead(id: u64, score: f64, severity: Severity, triaged: bool) -> LeadRecord {
    let base = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    LeadRecord {
        id: serde_json::json!(id),
        url: Some(format!("https://news.example/{id}")),
        title: Some(format!("Lead {id}")),
        publisher_domain: Some("news.example".to_string()),
        people: None,
        severity: Some(severity),
        case_type: Some(CaseType::Auto),
        lead_score: Some(score),
        triage_reasons: Some(vec!["reported crash".to_string()]),
        triaged_at: triaged.then(|| base + Duration::minutes(id as i64)),
        ingested_at: Some(base),
        status: Some(LeadStatus::New),
    }
}

/// 120 fatal leads scoring 70+, plus rows every fatal/70 filter must exclude.
fn seeded_rows() -> Vec<LeadRecord> {
    let mut rows: Vec<LeadRecord> = (1..=120)
        .map(|i| lead(i, 70.0 + (i % 30) as f64, Severity::Fatal, true))
        .collect();
    rows.push(lead(500, 69.9, Severity::Fatal, true));
    rows.push(lead(501, 95.0, Severity::Injury, true));
    rows.push(lead(502, 88.0, Severity::SeriousInjury, true));
    rows
}

fn fatal_query(page: u64) -> LeadQuery {
    LeadQuery {
        min_score: 70.0,
        severity: Selector::Only(Severity::Fatal),
        case_type: Selector::All,
        status: Selector::All,
        page,
    }
}

fn fetcher(source: Arc<MemorySource>) -> LeadFetcher {
    LeadFetcher::new(source, Resources::default())
}

#[tokio::test]
async fn primary_view_pages_through_matching_rows() {
    let source = Arc::new(MemorySource::default().with_resource("leads_triaged", seeded_rows()));
    let f = fetcher(source.clone());

    let first = f.fetch(&fatal_query(1)).await.unwrap();
    assert_eq!(first.rows.len(), 50);
    assert_eq!(first.total_count, 120);
    assert_eq!(first.source, Source::PrimaryView);

    let third = f.fetch(&fatal_query(3)).await.unwrap();
    assert_eq!(third.rows.len(), 20);
    assert_eq!(third.total_count, 120);
    assert_eq!(third.source, Source::PrimaryView);

    assert_eq!(source.calls().len(), 2);
}

#[tokio::test]
async fn total_count_ignores_the_requested_page() {
    let source = Arc::new(MemorySource::default().with_resource("leads_triaged", seeded_rows()));
    let f = fetcher(source);
    for page in [1, 2, 3, 7] {
        let r = f.fetch(&fatal_query(page)).await.unwrap();
        assert_eq!(r.total_count, 120, "page {page}");
    }
    let past_end = f.fetch(&fatal_query(7)).await.unwrap();
    assert!(past_end.rows.is_empty());
}

#[tokio::test]
async fn rows_arrive_newest_triage_first() {
    let source = Arc::new(MemorySource::default().with_resource("leads_triaged", seeded_rows()));
    let r = fetcher(source).fetch(&fatal_query(1)).await.unwrap();
    let times: Vec<_> = r.rows.iter().map(|r| r.triaged_at).collect();
    let mut sorted = times.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(times, sorted);
    assert_eq!(r.rows[0].id_text(), "120");
}

#[tokio::test]
async fn empty_primary_result_is_still_the_primary_view() {
    let source = Arc::new(
        MemorySource::default()
            .with_resource("leads_triaged", Vec::new())
            .with_resource("leads", seeded_rows()),
    );
    let r = fetcher(source.clone()).fetch(&fatal_query(1)).await.unwrap();
    assert!(r.rows.is_empty());
    assert_eq!(r.total_count, 0);
    assert_eq!(r.source, Source::PrimaryView);
    assert_eq!(source.calls().len(), 1);
}

#[tokio::test]
async fn view_failure_falls_back_to_triaged_table_rows() {
    let mut table = seeded_rows();
    table.push(lead(900, 99.0, Severity::Fatal, false));
    let source = Arc::new(
        MemorySource::default()
            .failing("leads_triaged", "relation \"leads_triaged\" does not exist")
            .with_resource("leads", table),
    );
    let r = fetcher(source.clone()).fetch(&fatal_query(1)).await.unwrap();
    assert_eq!(r.source, Source::FallbackTable);
    assert_eq!(r.total_count, 120);
    assert_eq!(r.rows.len(), 50);
    assert!(r.rows.iter().all(|row| row.triaged_at.is_some()));
}

#[tokio::test]
async fn fallback_request_mirrors_the_primary_request() {
    let queries = vec![
        LeadQuery::default(),
        fatal_query(2),
        LeadQuery {
            min_score: 55.5,
            severity: Selector::All,
            case_type: Selector::Only(CaseType::Pedestrian),
            status: Selector::Only(LeadStatus::Contacted),
            page: 4,
        },
    ];
    for query in queries {
        let source = Arc::new(
            MemorySource::default()
                .failing("leads_triaged", "view missing")
                .with_resource("leads", Vec::new()),
        );
        fetcher(source.clone()).fetch(&query).await.unwrap();
        let calls = source.calls();
        assert_eq!(calls.len(), 2);
        let (primary, fallback) = (&calls[0], &calls[1]);
        assert_eq!(primary.resource, "leads_triaged");
        assert_eq!(fallback.resource, "leads");
        assert_eq!(primary.range, fallback.range);
        assert_eq!(primary.range, query.range());
        assert_eq!(primary.order, fallback.order);

        let mut expected = primary.predicates.clone();
        expected.push(Predicate::NotNull {
            column: "triaged_at",
        });
        assert_eq!(fallback.predicates, expected);
        assert!(!primary
            .predicates
            .iter()
            .any(|p| matches!(p, Predicate::NotNull { .. })));
    }
}

#[tokio::test]
async fn both_failures_surface_both_messages_in_order() {
    let source = Arc::new(
        MemorySource::default()
            .failing("leads_triaged", "view is missing")
            .failing("leads", "table is missing"),
    );
    let err = fetcher(source).fetch(&fatal_query(1)).await.unwrap_err();
    let FetchError::BothFailed { primary, fallback } = &err;
    assert!(primary.to_string().contains("view is missing"));
    assert!(fallback.to_string().contains("table is missing"));

    let message = err.to_string();
    let view_at = message.find("view is missing").unwrap();
    let table_at = message.find("table is missing").unwrap();
    assert!(view_at < table_at);
}

#[tokio::test]
async fn concurrent_identical_fetches_agree() {
    let source = Arc::new(MemorySource::default().with_resource("leads_triaged", seeded_rows()));
    let f = fetcher(source);
    let q = fatal_query(2);
    let (a, b) = tokio::join!(f.fetch(&q), f.fetch(&q));
    assert_eq!(a.unwrap(), b.unwrap());
}

#[tokio::test]
async fn custom_resource_names_are_used() {
    let source = Arc::new(
        MemorySource::default()
            .failing("v_pi_leads", "nope")
            .with_resource("pi_leads", seeded_rows()),
    );
    let f = LeadFetcher::new(
        source.clone(),
        Resources {
            view: "v_pi_leads".to_string(),
            table: "pi_leads".to_string(),
        },
    );
    let r = f.fetch(&fatal_query(1)).await.unwrap();
    assert_eq!(r.source, Source::FallbackTable);
    let names: Vec<String> = source.calls().into_iter().map(|c| c.resource).collect();
    assert_eq!(names, vec!["v_pi_leads", "pi_leads"]);
}

#[tokio::test]
async fn filter_change_resets_page_before_the_next_fetch() {
    use crate::dashboard::{Dashboard, Features, FilterChange};

    let source = Arc::new(MemorySource::default().with_resource("leads_triaged", seeded_rows()));
    let f = fetcher(source.clone());
    let mut d = Dashboard::new(Features::default(), fatal_query(3));

    let (token, q) = d.begin_fetch();
    let result = f.fetch(&q).await;
    assert!(d.apply(token, result));
    assert_eq!(d.rows().len(), 20);

    d.set_filter(FilterChange::CaseType(Selector::Only(CaseType::Auto)))
        .unwrap();
    let (token, q) = d.begin_fetch();
    assert_eq!(q.page, 1);
    let result = f.fetch(&q).await;
    assert!(d.apply(token, result));
    assert_eq!(d.rows().len(), 50);
    assert_eq!(source.calls().last().unwrap().range.from, 0);
}
