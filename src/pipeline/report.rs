// src/pipeline/report.rs

//! Market statistics, insight prompt and artifact writing.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::RankedListing;
use crate::services::InsightGenerator;
use crate::storage::ReportStorage;
use crate::utils::slug;

const TOP_COMPANIES: usize = 5;
const PROMPT_DESCRIPTION_CHARS: usize = 200;
const HIGH_TIER: f64 = 120_000.0;
const MID_TIER: f64 = 80_000.0;

/// Statistics computed locally from the ranked listings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MarketStats {
    pub total: usize,
    pub with_salary: usize,
    pub average_salary: Option<f64>,
    pub min_salary: Option<f64>,
    pub max_salary: Option<f64>,
    /// Midpoint of at least 120k
    pub high_tier: usize,
    /// Midpoint from 80k up to 120k
    pub mid_tier: usize,
    /// Midpoint under 80k
    pub low_tier: usize,
    pub remote: usize,
    /// Most frequent companies, count descending then name
    pub top_companies: Vec<(String, usize)>,
    pub by_source: BTreeMap<String, usize>,
}

impl MarketStats {
    pub fn compute(listings: &[RankedListing]) -> Self {
        let mut stats = MarketStats {
            total: listings.len(),
            ..Self::default()
        };

        let mut midpoints = Vec::new();
        let mut companies: HashMap<&str, usize> = HashMap::new();

        for r in listings {
            let l = &r.listing;
            if let Some(salary) = &l.salary {
                let mid = salary.midpoint();
                midpoints.push(mid);
                stats.min_salary = Some(stats.min_salary.map_or(salary.min, |m| m.min(salary.min)));
                stats.max_salary = Some(stats.max_salary.map_or(salary.max, |m| m.max(salary.max)));
                if mid >= HIGH_TIER {
                    stats.high_tier += 1;
                } else if mid >= MID_TIER {
                    stats.mid_tier += 1;
                } else {
                    stats.low_tier += 1;
                }
            }
            if l.location.remote {
                stats.remote += 1;
            }
            if !l.company.is_empty() {
                *companies.entry(l.company.as_str()).or_default() += 1;
            }
            for source in &l.sources {
                *stats.by_source.entry(source.clone()).or_default() += 1;
            }
        }

        stats.with_salary = midpoints.len();
        if !midpoints.is_empty() {
            stats.average_salary = Some(midpoints.iter().sum::<f64>() / midpoints.len() as f64);
        }

        let mut top: Vec<(String, usize)> = companies
            .into_iter()
            .map(|(name, n)| (name.to_string(), n))
            .collect();
        top.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top.truncate(TOP_COMPANIES);
        stats.top_companies = top;

        stats
    }

    pub fn salary_coverage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.with_salary as f64 * 100.0 / self.total as f64
        }
    }
}

impl fmt::Display for MarketStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total listings: {}", self.total)?;
        writeln!(
            f,
            "Salary coverage: {}/{} ({:.1}%)",
            self.with_salary,
            self.total,
            self.salary_coverage()
        )?;
        if let (Some(avg), Some(min), Some(max)) =
            (self.average_salary, self.min_salary, self.max_salary)
        {
            writeln!(f, "Average annual salary: {avg:.0}")?;
            writeln!(f, "Salary range: {min:.0} - {max:.0}")?;
            writeln!(
                f,
                "Salary tiers: {} at 120k+, {} at 80k-120k, {} under 80k",
                self.high_tier, self.mid_tier, self.low_tier
            )?;
        }
        writeln!(f, "Remote listings: {}", self.remote)?;
        if !self.top_companies.is_empty() {
            writeln!(f, "Top companies:")?;
            for (name, n) in &self.top_companies {
                writeln!(f, "  {name}: {n}")?;
            }
        }
        if !self.by_source.is_empty() {
            writeln!(f, "Listings per source:")?;
            for (source, n) in &self.by_source {
                writeln!(f, "  {source}: {n}")?;
            }
        }
        Ok(())
    }
}

/// What the run searched for, used in file names and headers.
#[derive(Debug, Clone)]
pub struct ReportContext {
    pub terms: Vec<String>,
    pub locations: Vec<String>,
    pub run_at: DateTime<Utc>,
    pub top_n: usize,
}

impl ReportContext {
    fn search_label(&self) -> String {
        let terms = self.terms.join(", ");
        if self.locations.is_empty() {
            terms
        } else {
            format!("{terms} in {}", self.locations.join("; "))
        }
    }

    fn stamp(&self) -> String {
        self.run_at.format("%Y%m%d_%H%M%S").to_string()
    }

    pub fn export_name(&self) -> String {
        format!(
            "jobs_{}_{}_{}.csv",
            slug(&self.terms.join(" ")),
            slug(&self.locations.join(" ")),
            self.stamp()
        )
    }

    pub fn insight_name(&self) -> String {
        format!("insights_{}_{}.txt", slug(&self.terms.join(" ")), self.stamp())
    }
}

/// Build the prompt sent to the insight generator.
pub fn build_prompt(ctx: &ReportContext, listings: &[RankedListing], stats: &MarketStats) -> String {
    let mut prompt = format!(
        "Analyze the job market for: {}\n\nMARKET STATISTICS\n{stats}\nTOP {} LISTINGS\n",
        ctx.search_label(),
        ctx.top_n.min(listings.len())
    );

    for r in listings.iter().take(ctx.top_n) {
        let l = &r.listing;
        let salary = l
            .salary
            .as_ref()
            .map_or_else(|| "not listed".to_string(), |s| s.to_string());
        prompt.push_str(&format!(
            "{}. {} | {} | {} | {} | score {:.1}\n",
            r.rank,
            l.title,
            if l.company.is_empty() { "unknown company" } else { l.company.as_str() },
            l.location,
            salary,
            r.score
        ));
        if !l.description.is_empty() {
            let excerpt: String = l.description.chars().take(PROMPT_DESCRIPTION_CHARS).collect();
            prompt.push_str(&format!("   {excerpt}\n"));
        }
    }
    prompt
}

/// Insight file body: header, statistics, then the generated text verbatim.
pub fn render_insight(ctx: &ReportContext, stats: &MarketStats, insight: &str) -> String {
    let rule = "=".repeat(60);
    format!(
        "MARKET INSIGHTS\nSearch: {}\nGenerated: {}\n{rule}\n\n{stats}\n{rule}\n\n{insight}\n",
        ctx.search_label(),
        ctx.run_at.to_rfc3339(),
    )
}

/// Paths written by the reporter.
#[derive(Debug, Clone, Default)]
pub struct ReportOutcome {
    pub export_path: PathBuf,
    pub insight_path: Option<PathBuf>,
    /// Set when insight generation failed; the export is still written
    pub insight_error: Option<String>,
}

/// Write the export, then try the insight report.
///
/// Only a failed export write is an error.
pub async fn write_reports(
    ctx: &ReportContext,
    listings: &[RankedListing],
    storage: &dyn ReportStorage,
    generator: Option<&dyn InsightGenerator>,
) -> Result<ReportOutcome> {
    let export_path = storage.write_listings(&ctx.export_name(), listings).await?;
    let mut outcome = ReportOutcome {
        export_path,
        ..ReportOutcome::default()
    };

    let Some(generator) = generator else {
        log::info!("Insight generation disabled");
        return Ok(outcome);
    };

    let stats = MarketStats::compute(listings);
    let prompt = build_prompt(ctx, listings, &stats);
    log::info!("Requesting market insights from {}", generator.name());

    let written = match generator.generate(&prompt).await {
        Ok(text) => {
            storage
                .write_insight(&ctx.insight_name(), &render_insight(ctx, &stats, &text))
                .await
        }
        Err(e) => Err(e),
    };

    match written {
        Ok(path) => outcome.insight_path = Some(path),
        Err(e) => {
            log::warn!("Insight report skipped: {e}");
            outcome.insight_error = Some(e.to_string());
        }
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::{CanonicalListing, Location, SalaryPeriod, SalaryRange, ScoreBreakdown};
    use crate::storage::{LocalStorage, load_export};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn ranked(rank: usize, company: &str, salary: Option<(f64, f64)>, remote: bool) -> RankedListing {
        RankedListing {
            rank,
            score: 50.0 - rank as f64,
            breakdown: ScoreBreakdown::default(),
            listing: CanonicalListing {
                id: format!("id{rank}"),
                title: format!("Engineer {rank}"),
                company: company.into(),
                location: Location {
                    remote,
                    raw: if remote { "Remote".into() } else { "Denver, CO".into() },
                    ..Location::default()
                },
                salary: salary
                    .map(|(lo, hi)| SalaryRange::annualized(lo, hi, "USD", SalaryPeriod::Year)),
                description: "Build services".into(),
                sources: BTreeSet::from(["indeed".to_string()]),
                first_seen: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
                url: None,
                job_type: None,
            },
        }
    }

    fn context() -> ReportContext {
        ReportContext {
            terms: vec!["Rust Engineer".into()],
            locations: vec!["Remote".into()],
            run_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 15).unwrap(),
            top_n: 2,
        }
    }

    struct FixedInsight(std::result::Result<&'static str, &'static str>);

    #[async_trait]
    impl InsightGenerator for FixedInsight {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn generate(&self, _prompt: &str) -> Result<String> {
            self.0
                .map(str::to_string)
                .map_err(AppError::report)
        }
    }

    #[test]
    fn test_market_stats() {
        let listings = vec![
            ranked(1, "Acme", Some((130_000.0, 150_000.0)), true),
            ranked(2, "Acme", Some((90_000.0, 100_000.0)), false),
            ranked(3, "Beta", Some((50_000.0, 60_000.0)), true),
            ranked(4, "", None, false),
        ];
        let stats = MarketStats::compute(&listings);

        assert_eq!(stats.total, 4);
        assert_eq!(stats.with_salary, 3);
        assert_eq!(stats.salary_coverage(), 75.0);
        assert_eq!(stats.min_salary, Some(50_000.0));
        assert_eq!(stats.max_salary, Some(150_000.0));
        assert_eq!(stats.average_salary, Some(100_000.0));
        assert_eq!((stats.high_tier, stats.mid_tier, stats.low_tier), (1, 1, 1));
        assert_eq!(stats.remote, 2);
        assert_eq!(
            stats.top_companies,
            vec![("Acme".to_string(), 2), ("Beta".to_string(), 1)]
        );
        assert_eq!(stats.by_source.get("indeed"), Some(&4));
    }

    #[test]
    fn test_names_and_prompt() {
        let ctx = context();
        assert_eq!(ctx.export_name(), "jobs_rust_engineer_remote_20240501_093015.csv");
        assert_eq!(ctx.insight_name(), "insights_rust_engineer_20240501_093015.txt");

        let listings = vec![
            ranked(1, "Acme", Some((130_000.0, 150_000.0)), true),
            ranked(2, "Beta", None, false),
            ranked(3, "Gamma", None, false),
        ];
        let stats = MarketStats::compute(&listings);
        let prompt = build_prompt(&ctx, &listings, &stats);
        assert!(prompt.contains("Rust Engineer in Remote"));
        assert!(prompt.contains("TOP 2 LISTINGS"));
        assert!(prompt.contains("1. Engineer 1 | Acme | Remote | USD 130000-150000/year"));
        assert!(prompt.contains("Salary coverage: 1/3"));
        assert!(!prompt.contains("3. Engineer 3"));
    }

    #[tokio::test]
    async fn test_insight_failure_keeps_export() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());
        let listings = vec![ranked(1, "Acme", None, true)];
        let failing = FixedInsight(Err("upstream 500"));

        let outcome = write_reports(&context(), &listings, &storage, Some(&failing))
            .await
            .unwrap();

        assert!(outcome.export_path.exists());
        assert!(outcome.insight_path.is_none());
        assert!(outcome.insight_error.unwrap().contains("upstream 500"));
        assert_eq!(load_export(&outcome.export_path).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_insight_written_verbatim_after_stats() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());
        let listings = vec![ranked(1, "Acme", Some((100_000.0, 120_000.0)), true)];
        let generator = FixedInsight(Ok("MARKET_TRENDS: steady demand"));

        let outcome = write_reports(&context(), &listings, &storage, Some(&generator))
            .await
            .unwrap();

        let text = std::fs::read_to_string(outcome.insight_path.unwrap()).unwrap();
        assert!(text.starts_with("MARKET INSIGHTS\nSearch: Rust Engineer in Remote\n"));
        assert!(text.contains("Salary coverage: 1/1 (100.0%)"));
        assert!(text.ends_with("MARKET_TRENDS: steady demand\n"));
    }
}
