// src/pipeline/run.rs

//! Pipeline entry point.

use std::sync::Arc;

use chrono::Utc;

use crate::error::{AppError, Result};
use crate::models::{Config, RunSummary, SearchQuery};
use crate::pipeline::collect::{CollectOptions, collect};
use crate::pipeline::dedup::Deduplicator;
use crate::pipeline::normalize::Normalizer;
use crate::pipeline::rank::Ranker;
use crate::pipeline::report::{ReportContext, write_reports};
use crate::services::{InsightGenerator, SourceAdapter};
use crate::storage::ReportStorage;

/// Run collection, normalization, deduplication, ranking and reporting.
///
/// Configuration and output preparation errors are returned before any
/// fetching starts. Everything that fails later is recorded in the summary.
pub async fn run_pipeline(
    config: Arc<Config>,
    adapters: &[Box<dyn SourceAdapter>],
    storage: &dyn ReportStorage,
    insight: Option<&dyn InsightGenerator>,
) -> Result<RunSummary> {
    config.validate()?;
    if adapters.is_empty() {
        return Err(AppError::validation("no source adapters to run"));
    }
    storage.prepare().await?;

    // Built up front so a bad pattern fails before any request.
    let normalizer = Normalizer::new(&config.normalize)?;
    let deduplicator = Deduplicator::new(&config.dedup);
    let ranker = Ranker::new(&config.search, &config.ranking);

    let mut summary = RunSummary::new(Utc::now());
    let queries = SearchQuery::expand(&config.search.terms, &config.search.locations);

    let outcomes = collect(adapters, &queries, CollectOptions::from_config(&config.http)).await;
    let mut raws = Vec::new();
    for outcome in outcomes {
        summary.warnings += outcome.report.failed_attempts;
        raws.extend(outcome.listings);
        summary.sources.push(outcome.report);
    }
    summary.collected = raws.len();

    let (canonical, dropped) = normalizer.normalize_all(&raws);
    summary.dropped = dropped;

    let before = canonical.len();
    let unique = deduplicator.dedup(canonical);
    summary.merged = before - unique.len();

    let ranked = ranker.rank(unique);
    summary.ranked = ranked.len();

    let ctx = ReportContext {
        terms: config.search.terms.clone(),
        locations: config.search.locations.clone(),
        run_at: summary.started_at,
        top_n: config.report.top_n,
    };
    let report = write_reports(&ctx, &ranked, storage, insight).await?;
    if report.insight_error.is_some() {
        summary.warnings += 1;
    }
    summary.export_path = Some(report.export_path);
    summary.insight_path = report.insight_path;
    summary.insight_error = report.insight_error;

    log::info!(
        "Run finished: {} collected, {} dropped, {} merged, {} ranked, {} warnings",
        summary.collected,
        summary.dropped,
        summary.merged,
        summary.ranked,
        summary.warnings
    );
    Ok(summary)
}
