//! Service layer for the job search pipeline.
//!
//! This module contains the collaborators the pipeline talks to:
//! - Source adapters (`SourceAdapter`): Remotive, RemoteOK, HTML boards, JSON files
//! - Insight generation (`InsightGenerator`)

mod board;
mod file;
mod insight;
mod remoteok;
mod remotive;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::Result;
use crate::models::{Config, SearchQuery, SourcePage};
use crate::pipeline::rank::word_form;

pub use board::{BoardAdapter, parse_board_page};
pub use file::FileAdapter;
pub use insight::{InsightGenerator, OpenAiInsightGenerator, build_generator, sanitize_insight};
pub use remoteok::{RemoteOkAdapter, parse_remoteok};
pub use remotive::{RemotiveAdapter, parse_remotive};

/// Which parts of a query change what an adapter returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryScope {
    /// Every term and location pair is a distinct request
    TermAndLocation,
    /// Location is ignored; one request sequence per term
    TermOnly,
    /// The adapter returns the same records whatever the query
    Once,
}

/// A component fetching raw postings from one board or API.
///
/// Repeated calls with the returned cursor form a finite sequence of pages.
/// Malformed records are counted in `SourcePage::skipped`, never fail the page.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Adapter name, used in source sets and logs.
    fn name(&self) -> &str;

    fn scope(&self) -> QueryScope {
        QueryScope::TermAndLocation
    }

    /// Fetch the page at `cursor` (`None` for the first page).
    async fn fetch_page(&self, query: &SearchQuery, cursor: Option<u32>) -> Result<SourcePage>;
}

/// Build every enabled adapter from the configuration.
pub fn build_adapters(config: &Config, client: &Client) -> Result<Vec<Box<dyn SourceAdapter>>> {
    let sources = &config.sources;
    let mut adapters: Vec<Box<dyn SourceAdapter>> = Vec::new();

    if sources.remotive.enabled {
        adapters.push(Box::new(RemotiveAdapter::new(
            client.clone(),
            &sources.remotive.base_url,
        )));
    }
    if sources.remoteok.enabled {
        adapters.push(Box::new(RemoteOkAdapter::new(
            client.clone(),
            &sources.remoteok.base_url,
        )));
    }
    for board in sources.boards.iter().filter(|b| b.enabled) {
        adapters.push(Box::new(BoardAdapter::new(
            client.clone(),
            board.clone(),
            config.search.max_pages,
        )?));
    }
    for file in sources.files.iter().filter(|f| f.enabled) {
        adapters.push(Box::new(FileAdapter::new(&file.name, &file.path)));
    }

    log::info!(
        "Built {} source adapters: {}",
        adapters.len(),
        adapters
            .iter()
            .map(|a| a.name())
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(adapters)
}

/// Whether any word of `term` occurs as a whole word in `haystacks`.
///
/// Case-insensitive; an empty term matches everything.
pub(crate) fn matches_term(term: &str, haystacks: &[&str]) -> bool {
    let words: Vec<String> = word_form(term)
        .split_whitespace()
        .map(|w| format!(" {w} "))
        .collect();
    if words.is_empty() {
        return true;
    }
    haystacks.iter().any(|h| {
        let form = word_form(h);
        words.iter().any(|w| form.contains(w.as_str()))
    })
}
