use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_RANGE, RANGE, USER_AGENT};
use reqwest::StatusCode;
use serde::Deserialize;

use super::{BackendError, LeadSource};
use crate::model::LeadRecord;
use crate::query::{Page, SelectRequest};

#[derive(Clone, Debug)]
pub struct RestOptions {
    pub url: String,
    pub anon_key: String,
    pub timeout_seconds: u64,
}

/// Client for the hosted service's REST query endpoint (`{url}/rest/v1/{resource}`).
#[derive(Clone, Debug)]
pub struct RestBackend {
    base_url: String,
    client: reqwest::Client,
}

impl RestBackend {
    pub fn new(options: RestOptions) -> Result<Self, BackendError> {
        let base_url = options.url.trim().trim_end_matches('/').to_string();
        let parsed = reqwest::Url::parse(&base_url).map_err(|_| BackendError::InvalidUrl {
            url: options.url.clone(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(BackendError::InvalidUrl { url: options.url });
        }

        let key = options.anon_key.trim();
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("pi-lead-monitor/", env!("CARGO_PKG_VERSION"))),
        );
        headers.insert(
            "apikey",
            HeaderValue::from_str(key).map_err(|_| BackendError::InvalidKey)?,
        );
        let mut bearer =
            HeaderValue::from_str(&format!("Bearer {key}")).map_err(|_| BackendError::InvalidKey)?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(options.timeout_seconds.max(1)))
            .build()
            .map_err(|e| BackendError::HttpClientBuild { source: e })?;

        Ok(Self { base_url, client })
    }

    pub fn resource_url(&self, resource: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, resource.trim_matches('/'))
    }
}

#[async_trait]
impl LeadSource for RestBackend {
    async fn select(&self, request: &SelectRequest) -> Result<Page, BackendError> {
        let resource = request.resource.clone();
        let response = self
            .client
            .get(self.resource_url(&request.resource))
            .query(&request.query_pairs())
            .header("Range-Unit", "items")
            .header(RANGE, request.range.header_value())
            .header("Prefer", "count=exact")
            .send()
            .await
            .map_err(|e| BackendError::Transport {
                resource: resource.clone(),
                source: e,
            })?;

        let status = response.status();
        let content_range = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let body = response
            .text()
            .await
            .map_err(|e| BackendError::Transport {
                resource: resource.clone(),
                source: e,
            })?;

        if !status.is_success() && status != StatusCode::RANGE_NOT_SATISFIABLE {
            return Err(BackendError::Status {
                resource,
                status: status.as_u16(),
                message: error_message(status, &body),
            });
        }

        let reported_total = match content_range.as_deref() {
            Some(value) => parse_content_range_total(value).ok_or_else(|| {
                BackendError::ContentRange {
                    resource: resource.clone(),
                    value: value.to_string(),
                }
            })?,
            None => None,
        };

        // Asking for a window past the last row is an empty page, not a failure.
        if status == StatusCode::RANGE_NOT_SATISFIABLE {
            return Ok(Page {
                rows: Vec::new(),
                total_count: reported_total.unwrap_or(0),
            });
        }
        let rows: Vec<LeadRecord> =
            serde_json::from_str(&body).map_err(|e| BackendError::Decode {
                resource: resource.clone(),
                source: e,
            })?;
        let total_count = match reported_total {
            Some(total) => total,
            None => {
                tracing::debug!(%resource, "no exact count in response, using row count");
                rows.len() as u64
            }
        };
        Ok(Page { rows, total_count })
    }

    fn name(&self) -> &str {
        "rest"
    }
}

/// Total from `0-49/120` or `*/0`. `Some(None)` when the service reports `*` as total.
fn parse_content_range_total(value: &str) -> Option<Option<u64>> {
    let (range, total) = value.trim().split_once('/')?;
    let range = range.trim();
    if range != "*" {
        let (from, to) = range.split_once('-')?;
        from.trim().parse::<u64>().ok()?;
        to.trim().parse::<u64>().ok()?;
    }
    match total.trim() {
        "*" => Some(None),
        n => n.parse::<u64>().ok().map(Some),
    }
}

#[derive(Debug, Deserialize)]
struct ServiceError {
    message: Option<String>,
    details: Option<String>,
    hint: Option<String>,
    code: Option<String>,
}

fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(err) = serde_json::from_str::<ServiceError>(body) {
        if let Some(message) = err.message.filter(|m| !m.trim().is_empty()) {
            let mut out = message;
            if let Some(code) = err.code.filter(|c| !c.is_empty()) {
                out = format!("{out} ({code})");
            }
            if let Some(details) = err.details.filter(|d| !d.is_empty()) {
                out.push_str(": ");
                out.push_str(&details);
            }
            if let Some(hint) = err.hint.filter(|h| !h.is_empty()) {
                out.push_str(" hint: ");
                out.push_str(&hint);
            }
            return out;
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string()
    } else {
        trimmed.chars().take(200).collect()
    }
}
