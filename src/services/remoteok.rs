// src/services/remoteok.rs

//! RemoteOK API adapter.
//!
//! The API returns every open posting in one array whose first element is
//! a legal notice. Records are kept only when a word of the search term
//! appears in the position or company.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use super::{QueryScope, SourceAdapter, matches_term};
use crate::error::{AppError, Result};
use crate::models::{RawListing, SearchQuery, SourcePage};
use crate::utils::http;

const NAME: &str = "remoteok";

pub struct RemoteOkAdapter {
    client: Client,
    base_url: String,
}

impl RemoteOkAdapter {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl SourceAdapter for RemoteOkAdapter {
    fn name(&self) -> &str {
        NAME
    }

    fn scope(&self) -> QueryScope {
        QueryScope::TermOnly
    }

    async fn fetch_page(&self, query: &SearchQuery, _cursor: Option<u32>) -> Result<SourcePage> {
        let url = format!("{}/api", self.base_url);
        let body = http::fetch_text(&self.client, NAME, &url).await?;
        parse_remoteok(&body, query, Utc::now())
    }
}

#[derive(Debug, Deserialize)]
struct RemoteOkJob {
    #[serde(default)]
    id: Option<serde_json::Value>,
    position: String,
    #[serde(default)]
    company: String,
    #[serde(default)]
    location: String,
    #[serde(default)]
    salary_min: Option<f64>,
    #[serde(default)]
    salary_max: Option<f64>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    url: Option<String>,
}

impl RemoteOkJob {
    fn salary_text(&self) -> String {
        let positive = |v: Option<f64>| v.filter(|x| *x > 0.0);
        match (positive(self.salary_min), positive(self.salary_max)) {
            (Some(lo), Some(hi)) => format!("${lo:.0} - ${hi:.0} USD/year"),
            (Some(v), None) | (None, Some(v)) => format!("${v:.0} USD/year"),
            (None, None) => String::new(),
        }
    }
}

/// Parse a RemoteOK response body, filtering by the query term.
pub fn parse_remoteok(body: &str, query: &SearchQuery, now: DateTime<Utc>) -> Result<SourcePage> {
    let root: serde_json::Value =
        serde_json::from_str(body).map_err(|e| AppError::parse(NAME, e))?;
    let items = root
        .as_array()
        .ok_or_else(|| AppError::parse(NAME, "response is not an array"))?;

    let mut page = SourcePage::default();
    // First element is metadata
    for value in items.iter().skip(1) {
        let job: RemoteOkJob = match serde_json::from_value(value.clone()) {
            Ok(job) => job,
            Err(e) => {
                log::debug!("[{NAME}] skipping malformed record: {e}");
                page.skipped += 1;
                continue;
            }
        };

        if !matches_term(&query.term, &[&job.position, &job.company]) {
            continue;
        }

        let salary = job.salary_text();
        page.listings.push(RawListing {
            source: NAME.to_string(),
            source_id: job.id.map(|v| match v {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            }),
            title: job.position,
            company: job.company,
            location: if job.location.trim().is_empty() {
                "Remote".to_string()
            } else {
                job.location
            },
            salary,
            description: job.description,
            url: job.url,
            job_type: None,
            search_term: query.term.clone(),
            search_location: query.location.clone(),
            retrieved_at: now,
        });
    }
    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"[
        {"last_updated": 1700000000, "legal": "API terms"},
        {"id": "9001", "position": "Senior Rust Engineer", "company": "Acme",
         "location": "", "salary_min": 140000, "salary_max": 180000,
         "tags": ["rust", "backend"], "description": "Systems work",
         "url": "https://remoteok.com/remote-jobs/9001"},
        {"id": "9002", "position": "Marketing Lead", "company": "Beta",
         "tags": ["marketing"], "salary_min": 0, "salary_max": 0},
        {"id": "9005", "position": "Sales Manager", "company": "Epsilon",
         "tags": ["rust"]},
        {"id": "9003", "company": "Gamma"},
        {"id": 9004, "position": "Platform Developer (Rust)", "company": "Delta",
         "location": "Europe", "tags": ["Rust"], "salary_min": 90000}
    ]"#;

    #[test]
    fn test_parse_remoteok_filters_by_term() {
        let query = SearchQuery::new("rust", "");
        let page = parse_remoteok(BODY, &query, Utc::now()).unwrap();

        assert_eq!(page.skipped, 1);
        let titles: Vec<&str> = page.listings.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, vec!["Senior Rust Engineer", "Platform Developer (Rust)"]);

        let first = &page.listings[0];
        assert_eq!(first.location, "Remote");
        assert_eq!(first.salary, "$140000 - $180000 USD/year");
        assert_eq!(page.listings[1].source_id.as_deref(), Some("9004"));
        assert_eq!(page.listings[1].salary, "$90000 USD/year");
    }

    #[test]
    fn test_zero_salary_is_empty() {
        let query = SearchQuery::new("marketing", "");
        let page = parse_remoteok(BODY, &query, Utc::now()).unwrap();
        assert_eq!(page.listings.len(), 1);
        assert_eq!(page.listings[0].salary, "");
    }

    #[test]
    fn test_parse_remoteok_requires_array() {
        let query = SearchQuery::new("x", "");
        assert!(parse_remoteok("{}", &query, Utc::now()).is_err());
    }
}
