// src/pipeline/collect.rs

//! Concurrent collection from every source adapter.

use std::collections::HashSet;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tokio::time::Instant;

use crate::error::AppError;
use crate::models::{HttpConfig, RawListing, SearchQuery, SourcePage, SourceReport};
use crate::services::{QueryScope, SourceAdapter};
use crate::utils::rate_limit::{RateLimiter, instant_after};
use crate::utils::retry::RetryPolicy;

/// Collector knobs, usually taken from `[http]`.
#[derive(Debug, Clone, Copy)]
pub struct CollectOptions {
    pub retry: RetryPolicy,
    pub call_timeout: Duration,
    pub run_timeout: Duration,
    pub request_delay: Duration,
    pub max_concurrent: usize,
}

impl CollectOptions {
    pub fn from_config(config: &HttpConfig) -> Self {
        Self {
            retry: RetryPolicy::from_config(config),
            call_timeout: Duration::from_secs(config.timeout_secs),
            run_timeout: Duration::from_secs(config.run_timeout_secs),
            request_delay: Duration::from_millis(config.request_delay_ms),
            max_concurrent: config.max_concurrent.max(1),
        }
    }
}

/// Listings and counters of one adapter worker.
#[derive(Debug, Clone)]
pub struct SourceOutcome {
    pub report: SourceReport,
    pub listings: Vec<RawListing>,
}

enum Fetch {
    Page(SourcePage),
    Failed(AppError),
    Cancelled,
}

/// Run one worker per adapter and join their outcomes in adapter order.
pub async fn collect(
    adapters: &[Box<dyn SourceAdapter>],
    queries: &[SearchQuery],
    options: CollectOptions,
) -> Vec<SourceOutcome> {
    let deadline = instant_after(Instant::now(), options.run_timeout);
    let limiter = RateLimiter::new(options.request_delay);
    let limiter = &limiter;

    log::info!(
        "Collecting from {} sources for {} queries",
        adapters.len(),
        queries.len()
    );

    let mut outcomes: Vec<(usize, SourceOutcome)> = stream::iter(adapters.iter().enumerate())
        .map(|(index, adapter)| async move {
            let scoped = scoped_queries(adapter.scope(), queries);
            let outcome = run_source(&**adapter, &scoped, &options, limiter, deadline).await;
            (index, outcome)
        })
        .buffer_unordered(options.max_concurrent)
        .collect()
        .await;

    outcomes.sort_by_key(|(index, _)| *index);
    outcomes.into_iter().map(|(_, outcome)| outcome).collect()
}

/// Queries an adapter actually needs to see.
fn scoped_queries(scope: QueryScope, queries: &[SearchQuery]) -> Vec<SearchQuery> {
    match scope {
        QueryScope::TermAndLocation => queries.to_vec(),
        QueryScope::TermOnly => {
            let mut seen = HashSet::new();
            queries
                .iter()
                .filter(|q| seen.insert(q.term.clone()))
                .map(|q| SearchQuery::new(q.term.clone(), ""))
                .collect()
        }
        QueryScope::Once => queries.first().cloned().into_iter().collect(),
    }
}

async fn run_source(
    adapter: &dyn SourceAdapter,
    queries: &[SearchQuery],
    options: &CollectOptions,
    limiter: &RateLimiter,
    deadline: Instant,
) -> SourceOutcome {
    let mut report = SourceReport::new(adapter.name());
    let mut listings = Vec::new();

    'queries: for query in queries {
        let mut cursor = None;
        loop {
            match fetch_with_retry(adapter, query, cursor, options, limiter, deadline, &mut report)
                .await
            {
                Fetch::Page(page) => {
                    report.pages += 1;
                    report.fetched += page.listings.len();
                    report.skipped += page.skipped;
                    if page.skipped > 0 {
                        log::debug!(
                            "{}: skipped {} malformed records on page {:?}",
                            adapter.name(),
                            page.skipped,
                            cursor
                        );
                    }
                    listings.extend(page.listings);
                    match page.next {
                        Some(next) => cursor = Some(next),
                        None => break,
                    }
                }
                Fetch::Failed(e) => {
                    log::warn!("{}: giving up: {e}", adapter.name());
                    report.error = Some(e.to_string());
                    break 'queries;
                }
                Fetch::Cancelled => {
                    log::warn!("{}: run deadline reached, keeping {} listings", adapter.name(), listings.len());
                    report.cancelled = true;
                    break 'queries;
                }
            }
        }
    }

    log::info!(
        "{}: {} listings from {} pages ({} skipped, {} failed attempts)",
        report.source,
        report.fetched,
        report.pages,
        report.skipped,
        report.failed_attempts
    );
    SourceOutcome { report, listings }
}

async fn fetch_with_retry(
    adapter: &dyn SourceAdapter,
    query: &SearchQuery,
    cursor: Option<u32>,
    options: &CollectOptions,
    limiter: &RateLimiter,
    deadline: Instant,
    report: &mut SourceReport,
) -> Fetch {
    let mut attempt = 0;
    loop {
        if !limiter.acquire(deadline).await {
            return Fetch::Cancelled;
        }
        attempt += 1;

        let call_deadline = deadline.min(instant_after(Instant::now(), options.call_timeout));
        let error = match tokio::time::timeout_at(call_deadline, adapter.fetch_page(query, cursor))
            .await
        {
            Ok(Ok(page)) => return Fetch::Page(page),
            Ok(Err(e)) => e,
            Err(_) if Instant::now() >= deadline => return Fetch::Cancelled,
            Err(_) => AppError::unavailable(
                adapter.name(),
                format!("timed out after {}s", options.call_timeout.as_secs_f64()),
            ),
        };

        report.failed_attempts += 1;
        log::warn!(
            "{}: attempt {attempt} for '{}' failed: {error}",
            adapter.name(),
            query.term
        );

        if !error.is_retryable() || !options.retry.allows_retry(attempt) {
            return Fetch::Failed(error);
        }

        let delay = options.retry.delay_for(attempt, error.retry_after());
        if instant_after(Instant::now(), delay) >= deadline {
            return Fetch::Cancelled;
        }
        log::debug!("{}: retrying in {delay:?}", adapter.name());
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn raw(source: &str, title: &str) -> RawListing {
        RawListing {
            source: source.into(),
            source_id: None,
            title: title.into(),
            company: "Acme".into(),
            location: "Remote".into(),
            salary: String::new(),
            description: String::new(),
            url: None,
            job_type: None,
            search_term: "rust".into(),
            search_location: String::new(),
            retrieved_at: Utc::now(),
        }
    }

    fn options(max_attempts: u32) -> CollectOptions {
        CollectOptions {
            retry: RetryPolicy::new(max_attempts, Duration::from_millis(100), Duration::from_secs(1)),
            call_timeout: Duration::from_secs(5),
            run_timeout: Duration::from_secs(60),
            request_delay: Duration::ZERO,
            max_concurrent: 4,
        }
    }

    /// Serves `pages` pages, failing the first `failures` calls with `error`.
    struct Scripted {
        name: &'static str,
        scope: QueryScope,
        pages: u32,
        failures: AtomicUsize,
        error: fn() -> AppError,
        seen: Mutex<Vec<(String, Option<u32>)>>,
    }

    impl Scripted {
        fn new(name: &'static str, pages: u32) -> Self {
            Self {
                name,
                scope: QueryScope::TermAndLocation,
                pages,
                failures: AtomicUsize::new(0),
                error: || AppError::unavailable("scripted", "HTTP 503"),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SourceAdapter for Scripted {
        fn name(&self) -> &str {
            self.name
        }

        fn scope(&self) -> QueryScope {
            self.scope
        }

        async fn fetch_page(&self, query: &SearchQuery, cursor: Option<u32>) -> Result<SourcePage> {
            self.seen
                .lock()
                .unwrap()
                .push((format!("{}|{}", query.term, query.location), cursor));
            if self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err((self.error)());
            }
            let page = cursor.unwrap_or(0);
            Ok(SourcePage {
                listings: vec![raw(self.name, &format!("{} {page}", query.term))],
                skipped: 1,
                next: (page + 1 < self.pages).then_some(page + 1),
            })
        }
    }

    struct Hangs;

    #[async_trait]
    impl SourceAdapter for Hangs {
        fn name(&self) -> &str {
            "hangs"
        }

        async fn fetch_page(&self, _query: &SearchQuery, _cursor: Option<u32>) -> Result<SourcePage> {
            std::future::pending().await
        }
    }

    fn queries() -> Vec<SearchQuery> {
        SearchQuery::expand(
            &["rust".to_string(), "go".to_string()],
            &["Remote".to_string(), "Berlin".to_string()],
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_paginates_and_keeps_adapter_order() {
        let adapters: Vec<Box<dyn SourceAdapter>> = vec![
            Box::new(Scripted::new("first", 2)),
            Box::new(Scripted::new("second", 1)),
        ];
        let outcomes = collect(&adapters, &queries(), options(3)).await;

        assert_eq!(outcomes[0].report.source, "first");
        assert_eq!(outcomes[0].report.pages, 8);
        assert_eq!(outcomes[0].listings.len(), 8);
        assert_eq!(outcomes[0].report.skipped, 8);
        assert!(outcomes[0].report.is_complete());
        assert_eq!(outcomes[1].report.pages, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_scopes() {
        let mut term_only = Scripted::new("terms", 1);
        term_only.scope = QueryScope::TermOnly;
        let mut once = Scripted::new("once", 1);
        once.scope = QueryScope::Once;

        let scoped = scoped_queries(term_only.scope, &queries());
        assert_eq!(
            scoped,
            vec![SearchQuery::new("rust", ""), SearchQuery::new("go", "")]
        );
        assert_eq!(scoped_queries(once.scope, &queries()).len(), 1);

        let adapters: Vec<Box<dyn SourceAdapter>> = vec![Box::new(term_only), Box::new(once)];
        let outcomes = collect(&adapters, &queries(), options(1)).await;
        assert_eq!(outcomes[0].listings.len(), 2);
        assert_eq!(outcomes[1].listings.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_are_retried_and_counted() {
        let flaky = Scripted::new("flaky", 1);
        flaky.failures.store(2, Ordering::SeqCst);
        let adapters: Vec<Box<dyn SourceAdapter>> = vec![Box::new(flaky)];

        let outcomes = collect(&adapters, &[SearchQuery::new("rust", "")], options(3)).await;
        let report = &outcomes[0].report;
        assert_eq!(report.failed_attempts, 2);
        assert_eq!(report.pages, 1);
        assert!(report.is_complete());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_hint_sets_the_wait() {
        let mut limited = Scripted::new("limited", 1);
        limited.failures.store(10, Ordering::SeqCst);
        limited.error = || AppError::RateLimited {
            source_name: "limited".into(),
            retry_after: Some(Duration::from_millis(700)),
        };
        let adapters: Vec<Box<dyn SourceAdapter>> = vec![Box::new(limited)];

        let started = Instant::now();
        let outcomes = collect(&adapters, &[SearchQuery::new("rust", "")], options(3)).await;
        let elapsed = Instant::now() - started;

        // two waits of 700ms, the hint beating 100ms and 200ms backoff
        assert!(elapsed >= Duration::from_millis(1400), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(1500), "{elapsed:?}");
        let report = &outcomes[0].report;
        assert_eq!(report.failed_attempts, 3);
        assert!(report.error.is_some());
        assert!(!report.cancelled);
        assert!(outcomes[0].listings.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_hint_is_capped() {
        let mut limited = Scripted::new("limited", 1);
        limited.failures.store(10, Ordering::SeqCst);
        limited.error = || AppError::RateLimited {
            source_name: "limited".into(),
            retry_after: Some(Duration::from_secs(30)),
        };
        let adapters: Vec<Box<dyn SourceAdapter>> = vec![Box::new(limited)];

        let started = Instant::now();
        let outcomes = collect(&adapters, &[SearchQuery::new("rust", "")], options(3)).await;
        let elapsed = Instant::now() - started;

        assert!(elapsed >= Duration::from_secs(2), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(2100), "{elapsed:?}");
        assert_eq!(outcomes[0].report.failed_attempts, 3);
        assert!(outcomes[0].report.error.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_timeouts_do_not_overflow() {
        let mut opts = options(1);
        opts.call_timeout = Duration::MAX;
        opts.run_timeout = Duration::MAX;
        let adapters: Vec<Box<dyn SourceAdapter>> = vec![Box::new(Scripted::new("slow", 2))];

        let outcomes = collect(&adapters, &[SearchQuery::new("rust", "")], opts).await;
        assert_eq!(outcomes[0].report.pages, 2);
        assert!(outcomes[0].report.is_complete());
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_failure_stops_source_immediately() {
        let mut refused = Scripted::new("refused", 3);
        refused.failures.store(1, Ordering::SeqCst);
        refused.error = || AppError::refused("refused", "HTTP 403");
        let adapters: Vec<Box<dyn SourceAdapter>> =
            vec![Box::new(refused), Box::new(Scripted::new("ok", 1))];

        let outcomes = collect(&adapters, &queries(), options(3)).await;
        assert_eq!(outcomes[0].report.failed_attempts, 1);
        assert!(outcomes[0].report.error.as_deref().unwrap().contains("403"));
        assert!(outcomes[0].listings.is_empty());
        assert_eq!(outcomes[1].listings.len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_source_times_out_per_attempt() {
        let adapters: Vec<Box<dyn SourceAdapter>> =
            vec![Box::new(Hangs), Box::new(Scripted::new("ok", 1))];

        let outcomes = collect(&adapters, &[SearchQuery::new("rust", "")], options(3)).await;
        assert_eq!(outcomes[0].report.failed_attempts, 3);
        assert!(outcomes[0].report.error.as_deref().unwrap().contains("timed out"));
        assert!(!outcomes[0].report.cancelled);
        assert_eq!(outcomes[1].listings.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_deadline_cancels_outstanding_workers() {
        let mut opts = options(10);
        opts.call_timeout = Duration::from_secs(30);
        opts.run_timeout = Duration::from_secs(45);
        let adapters: Vec<Box<dyn SourceAdapter>> = vec![Box::new(Hangs)];

        let started = Instant::now();
        let outcomes = collect(&adapters, &[SearchQuery::new("rust", "")], opts).await;
        let report = &outcomes[0].report;
        assert!(report.cancelled);
        assert_eq!(report.failed_attempts, 1);
        assert!(Instant::now() - started <= Duration::from_secs(46));
    }
}
