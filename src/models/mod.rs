// src/models/mod.rs

//! Domain models for the job search pipeline.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod listing;
mod selectors;
mod stats;

// Re-export all public types
pub use config::{
    ApiSourceConfig, BoardConfig, Config, DedupConfig, FileSourceConfig, HttpConfig,
    NormalizeConfig, OutputConfig, RankingConfig, ReportConfig, ScoreWeights, SearchConfig,
    SourcesConfig,
};
pub use listing::{
    CanonicalListing, Location, RankedListing, RawListing, SalaryPeriod, SalaryRange,
    ScoreBreakdown, duplicate_key,
};
pub use selectors::ListingSelectors;
pub use stats::{RunSummary, SourceReport};

/// One search issued to every source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchQuery {
    pub term: String,
    pub location: String,
}

impl SearchQuery {
    pub fn new(term: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            location: location.into(),
        }
    }

    /// Every term paired with every location; an empty location list yields `""`.
    pub fn expand(terms: &[String], locations: &[String]) -> Vec<Self> {
        let locations: Vec<&str> = if locations.is_empty() {
            vec![""]
        } else {
            locations.iter().map(String::as_str).collect()
        };

        terms
            .iter()
            .filter(|t| !t.trim().is_empty())
            .flat_map(|t| locations.iter().map(move |l| Self::new(t.trim(), l.trim())))
            .collect()
    }
}

/// One page returned by a source adapter.
#[derive(Debug, Clone, Default)]
pub struct SourcePage {
    pub listings: Vec<RawListing>,

    /// Malformed records skipped on this page
    pub skipped: usize,

    /// Cursor of the next page, `None` when the sequence ends
    pub next: Option<u32>,
}
