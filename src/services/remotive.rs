// src/services/remotive.rs

//! Remotive remote-jobs API adapter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use super::{QueryScope, SourceAdapter};
use crate::error::{AppError, Result};
use crate::models::{RawListing, SearchQuery, SourcePage};
use crate::utils::{encode_query, http};

const NAME: &str = "remotive";

pub struct RemotiveAdapter {
    client: Client,
    base_url: String,
}

impl RemotiveAdapter {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn search_url(&self, term: &str) -> String {
        format!("{}/api/remote-jobs?search={}", self.base_url, encode_query(term))
    }
}

#[async_trait]
impl SourceAdapter for RemotiveAdapter {
    fn name(&self) -> &str {
        NAME
    }

    fn scope(&self) -> QueryScope {
        QueryScope::TermOnly
    }

    async fn fetch_page(&self, query: &SearchQuery, _cursor: Option<u32>) -> Result<SourcePage> {
        let body = http::fetch_text(&self.client, NAME, &self.search_url(&query.term)).await?;
        parse_remotive(&body, query, Utc::now())
    }
}

#[derive(Debug, Deserialize)]
struct RemotiveJob {
    #[serde(default)]
    id: Option<serde_json::Value>,
    title: String,
    #[serde(default)]
    company_name: String,
    #[serde(default)]
    candidate_required_location: String,
    #[serde(default)]
    salary: String,
    #[serde(default)]
    job_type: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    url: Option<String>,
}

/// Parse a Remotive response body. The API has a single page.
pub fn parse_remotive(body: &str, query: &SearchQuery, now: DateTime<Utc>) -> Result<SourcePage> {
    let root: serde_json::Value =
        serde_json::from_str(body).map_err(|e| AppError::parse(NAME, e))?;
    let jobs = root
        .get("jobs")
        .and_then(|j| j.as_array())
        .ok_or_else(|| AppError::parse(NAME, "response has no jobs array"))?;

    let mut page = SourcePage::default();
    for value in jobs {
        let job: RemotiveJob = match serde_json::from_value(value.clone()) {
            Ok(job) => job,
            Err(e) => {
                log::debug!("[{NAME}] skipping malformed record: {e}");
                page.skipped += 1;
                continue;
            }
        };

        page.listings.push(RawListing {
            source: NAME.to_string(),
            source_id: job.id.map(|v| match v {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            }),
            title: job.title,
            company: job.company_name,
            location: job.candidate_required_location,
            salary: job.salary,
            description: job.description,
            url: job.url,
            job_type: job.job_type,
            search_term: query.term.clone(),
            search_location: query.location.clone(),
            retrieved_at: now,
        });
    }
    Ok(page)
}
