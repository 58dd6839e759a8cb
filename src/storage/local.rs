//! Local filesystem storage implementation.
//!
//! Every file is written to a temporary sibling and renamed into place,
//! so a reader never sees a partial export.

use std::collections::BTreeSet;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{
    CanonicalListing, Location, RankedListing, SalaryPeriod, SalaryRange, ScoreBreakdown,
};
use crate::storage::ReportStorage;

const PROBE_FILE: &str = ".jobhunt_write_probe";

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root_dir
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.path(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(path)
    }
}

#[async_trait]
impl ReportStorage for LocalStorage {
    async fn prepare(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root_dir).await?;
        let probe = self.path(PROBE_FILE);
        tokio::fs::write(&probe, b"ok").await?;
        tokio::fs::remove_file(&probe).await?;
        Ok(())
    }

    async fn write_listings(&self, name: &str, listings: &[RankedListing]) -> Result<PathBuf> {
        let mut buf = Vec::new();
        write_export(&mut buf, listings)?;
        let path = self.write_bytes(name, &buf).await?;
        log::info!("Wrote {} listings to {}", listings.len(), path.display());
        Ok(path)
    }

    async fn write_insight(&self, name: &str, text: &str) -> Result<PathBuf> {
        let path = self.write_bytes(name, text.as_bytes()).await?;
        log::info!("Wrote insight report to {}", path.display());
        Ok(path)
    }
}

/// One CSV row of the ranked export.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportRecord {
    pub rank: usize,
    pub score: f64,
    pub relevance_score: f64,
    pub salary_score: f64,
    pub growth_score: f64,
    pub location_score: f64,
    pub id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub remote: bool,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub salary_currency: Option<String>,
    pub salary_period: Option<String>,
    pub description: String,
    /// Adapter names joined by `;`
    pub sources: String,
    pub first_seen: DateTime<Utc>,
    pub url: Option<String>,
    pub job_type: Option<String>,
}

impl From<&RankedListing> for ExportRecord {
    fn from(r: &RankedListing) -> Self {
        let l = &r.listing;
        Self {
            rank: r.rank,
            score: r.score,
            relevance_score: r.breakdown.relevance,
            salary_score: r.breakdown.salary,
            growth_score: r.breakdown.growth,
            location_score: r.breakdown.location,
            id: l.id.clone(),
            title: l.title.clone(),
            company: l.company.clone(),
            location: l.location.raw.clone(),
            city: l.location.city.clone(),
            region: l.location.region.clone(),
            country: l.location.country.clone(),
            remote: l.location.remote,
            salary_min: l.salary.as_ref().map(|s| s.min),
            salary_max: l.salary.as_ref().map(|s| s.max),
            salary_currency: l.salary.as_ref().map(|s| s.currency.clone()),
            salary_period: l.salary.as_ref().map(|s| s.period.to_string()),
            description: l.description.clone(),
            sources: l.sources.iter().cloned().collect::<Vec<_>>().join(";"),
            first_seen: l.first_seen,
            url: l.url.clone(),
            job_type: l.job_type.clone(),
        }
    }
}

impl TryFrom<ExportRecord> for RankedListing {
    type Error = AppError;

    fn try_from(r: ExportRecord) -> Result<Self> {
        let salary = match (r.salary_min, r.salary_max) {
            (Some(min), Some(max)) => {
                let period = r
                    .salary_period
                    .as_deref()
                    .map(|p| {
                        SalaryPeriod::parse(p)
                            .ok_or_else(|| AppError::parse("export", format!("bad period '{p}'")))
                    })
                    .transpose()?
                    .unwrap_or(SalaryPeriod::Year);
                Some(SalaryRange {
                    min,
                    max,
                    currency: r.salary_currency.unwrap_or_default(),
                    period,
                })
            }
            (None, None) => None,
            _ => {
                return Err(AppError::parse(
                    "export",
                    format!("row {} has a half-open salary", r.rank),
                ));
            }
        };

        let sources: BTreeSet<String> = r
            .sources
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        Ok(RankedListing {
            rank: r.rank,
            score: r.score,
            breakdown: ScoreBreakdown {
                relevance: r.relevance_score,
                salary: r.salary_score,
                growth: r.growth_score,
                location: r.location_score,
            },
            listing: CanonicalListing {
                id: r.id,
                title: r.title,
                company: r.company,
                location: Location {
                    city: r.city,
                    region: r.region,
                    country: r.country,
                    remote: r.remote,
                    raw: r.location,
                },
                salary,
                description: r.description,
                sources,
                first_seen: r.first_seen,
                url: r.url,
                job_type: r.job_type,
            },
        })
    }
}

/// Serialize ranked listings as CSV into `writer`.
pub fn write_export<W: Write>(writer: W, listings: &[RankedListing]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for listing in listings {
        wtr.serialize(ExportRecord::from(listing))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Read ranked listings back from CSV.
pub fn read_export<R: Read>(reader: R) -> Result<Vec<RankedListing>> {
    let mut rdr = csv::Reader::from_reader(reader);
    rdr.deserialize::<ExportRecord>()
        .map(|row| RankedListing::try_from(row?))
        .collect()
}

/// Read an export file written by a previous run.
pub fn load_export(path: impl AsRef<Path>) -> Result<Vec<RankedListing>> {
    let file = std::fs::File::open(path)?;
    read_export(std::io::BufReader::new(file))
}
