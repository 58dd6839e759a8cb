// src/services/file.rs

//! Adapter reading raw listings from a local JSON file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{QueryScope, SourceAdapter};
use crate::error::{AppError, Result};
use crate::models::{RawListing, SearchQuery, SourcePage};

/// Serves a JSON array of raw records; used for offline runs.
pub struct FileAdapter {
    name: String,
    path: PathBuf,
}

impl FileAdapter {
    pub fn new(name: &str, path: impl AsRef<Path>) -> Self {
        Self {
            name: name.to_string(),
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct FileRecord {
    #[serde(default)]
    id: Option<String>,
    title: String,
    #[serde(default)]
    company: String,
    #[serde(default)]
    location: String,
    #[serde(default)]
    salary: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    job_type: Option<String>,
    #[serde(default)]
    retrieved_at: Option<DateTime<Utc>>,
}

#[async_trait]
impl SourceAdapter for FileAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn scope(&self) -> QueryScope {
        QueryScope::Once
    }

    async fn fetch_page(&self, query: &SearchQuery, _cursor: Option<u32>) -> Result<SourcePage> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| AppError::refused(&self.name, format!("{}: {e}", self.path.display())))?;
        parse_records(&self.name, &content, query, Utc::now())
    }
}

fn parse_records(
    source: &str,
    content: &str,
    query: &SearchQuery,
    now: DateTime<Utc>,
) -> Result<SourcePage> {
    let values: Vec<serde_json::Value> =
        serde_json::from_str(content).map_err(|e| AppError::parse(source, e))?;

    let mut page = SourcePage::default();
    for value in values {
        match serde_json::from_value::<FileRecord>(value) {
            Ok(r) => page.listings.push(RawListing {
                source: source.to_string(),
                source_id: r.id,
                title: r.title,
                company: r.company,
                location: r.location,
                salary: r.salary,
                description: r.description,
                url: r.url,
                job_type: r.job_type,
                search_term: query.term.clone(),
                search_location: query.location.clone(),
                retrieved_at: r.retrieved_at.unwrap_or(now),
            }),
            Err(e) => {
                log::debug!("[{source}] skipping malformed record: {e}");
                page.skipped += 1;
            }
        }
    }
    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_reads_fixture_and_counts_malformed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("jobs.json");
        std::fs::write(
            &path,
            r#"[
                {"title": "Software Engineer", "company": "Acme", "salary": "$100k-$120k",
                 "retrieved_at": "2024-03-01T12:00:00Z"},
                {"company": "Missing title"},
                {"title": "QA Analyst", "location": "Remote"}
            ]"#,
        )
        .unwrap();

        let adapter = FileAdapter::new("fixture", &path);
        let page = adapter
            .fetch_page(&SearchQuery::new("engineer", ""), None)
            .await
            .unwrap();

        assert_eq!(page.listings.len(), 2);
        assert_eq!(page.skipped, 1);
        assert_eq!(page.next, None);
        assert_eq!(
            page.listings[0].retrieved_at.to_rfc3339(),
            "2024-03-01T12:00:00+00:00"
        );
        assert_eq!(page.listings[1].source, "fixture");
    }

    #[tokio::test]
    async fn test_missing_file_is_not_retryable() {
        let adapter = FileAdapter::new("fixture", "/nonexistent/jobs.json");
        let err = adapter
            .fetch_page(&SearchQuery::new("x", ""), None)
            .await
            .unwrap_err();
        assert!(!err.is_retryable());
    }
}
