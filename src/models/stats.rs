//! Per-source and per-run statistics.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// What one adapter worker accomplished.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct SourceReport {
    pub source: String,

    /// Pages fetched successfully
    pub pages: usize,

    /// Raw listings collected
    pub fetched: usize,

    /// Malformed records skipped by the adapter
    pub skipped: usize,

    /// Attempts that failed, retried or not
    pub failed_attempts: usize,

    /// Last error that stopped the source, if any
    pub error: Option<String>,

    /// The run deadline passed before the source finished
    pub cancelled: bool,
}

impl SourceReport {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Self::default()
        }
    }

    /// Whether the source ran to completion without a stopping error.
    pub fn is_complete(&self) -> bool {
        self.error.is_none() && !self.cancelled
    }
}

/// Outcome of a pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,

    pub sources: Vec<SourceReport>,

    /// Raw listings handed to the normalizer
    pub collected: usize,

    /// Records dropped by normalization
    pub dropped: usize,

    /// Records folded into another by deduplication
    pub merged: usize,

    /// Listings in the final ranking
    pub ranked: usize,

    /// Failed fetch attempts plus a failed insight generation
    pub warnings: usize,

    pub export_path: Option<PathBuf>,

    pub insight_path: Option<PathBuf>,

    pub insight_error: Option<String>,
}

impl RunSummary {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            sources: Vec::new(),
            collected: 0,
            dropped: 0,
            merged: 0,
            ranked: 0,
            warnings: 0,
            export_path: None,
            insight_path: None,
            insight_error: None,
        }
    }

    /// Records skipped by adapters across every source.
    pub fn skipped(&self) -> usize {
        self.sources.iter().map(|s| s.skipped).sum()
    }
}
