//! Listing data structures at each pipeline stage.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A posting exactly as a source adapter captured it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawListing {
    /// Name of the adapter that produced the record
    pub source: String,

    /// Identifier assigned by the source, if it exposes one
    #[serde(default)]
    pub source_id: Option<String>,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub company: String,

    #[serde(default)]
    pub location: String,

    #[serde(default)]
    pub salary: String,

    #[serde(default)]
    pub description: String,

    /// Full URL of the posting
    #[serde(default)]
    pub url: Option<String>,

    /// Employment type as written by the source (full-time, contract, ...)
    #[serde(default)]
    pub job_type: Option<String>,

    /// Search term that produced the record
    #[serde(default)]
    pub search_term: String,

    /// Search location that produced the record
    #[serde(default)]
    pub search_location: String,

    /// When the record was fetched
    pub retrieved_at: DateTime<Utc>,
}

/// Pay period quoted by a posting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum SalaryPeriod {
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl SalaryPeriod {
    /// Multiplier converting an amount in this period to a yearly amount.
    pub fn annual_factor(self) -> f64 {
        match self {
            SalaryPeriod::Hour => 2080.0,
            SalaryPeriod::Day => 260.0,
            SalaryPeriod::Week => 52.0,
            SalaryPeriod::Month => 12.0,
            SalaryPeriod::Year => 1.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SalaryPeriod::Hour => "hour",
            SalaryPeriod::Day => "day",
            SalaryPeriod::Week => "week",
            SalaryPeriod::Month => "month",
            SalaryPeriod::Year => "year",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "hour" => Some(SalaryPeriod::Hour),
            "day" => Some(SalaryPeriod::Day),
            "week" => Some(SalaryPeriod::Week),
            "month" => Some(SalaryPeriod::Month),
            "year" => Some(SalaryPeriod::Year),
            _ => None,
        }
    }
}

impl fmt::Display for SalaryPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Annualized salary range.
///
/// `min <= max` always holds; constructors swap reversed bounds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SalaryRange {
    /// Lower bound, per year
    pub min: f64,

    /// Upper bound, per year
    pub max: f64,

    /// ISO 4217 currency code
    pub currency: String,

    /// Period the posting originally quoted
    pub period: SalaryPeriod,
}

impl SalaryRange {
    /// Build a range from amounts quoted in `period`, annualizing them.
    pub fn annualized(low: f64, high: f64, currency: impl Into<String>, period: SalaryPeriod) -> Self {
        let factor = period.annual_factor();
        let (min, max) = if low <= high { (low, high) } else { (high, low) };
        Self {
            min: (min * factor).round(),
            max: (max * factor).round(),
            currency: currency.into(),
            period,
        }
    }

    /// Midpoint of the yearly range.
    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }
}

impl fmt::Display for SalaryRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.min == self.max {
            write!(f, "{} {:.0}/year", self.currency, self.min)
        } else {
            write!(f, "{} {:.0}-{:.0}/year", self.currency, self.min, self.max)
        }
    }
}

/// Structured location with a free-text fallback.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Location {
    #[serde(default)]
    pub city: Option<String>,

    #[serde(default)]
    pub region: Option<String>,

    #[serde(default)]
    pub country: Option<String>,

    #[serde(default)]
    pub remote: bool,

    /// Normalized source text, always kept
    #[serde(default)]
    pub raw: String,
}

impl Location {
    /// Location known only by its raw text.
    pub fn unresolved(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            ..Self::default()
        }
    }

    /// Whether any structured part was resolved.
    pub fn is_structured(&self) -> bool {
        self.remote || self.city.is_some() || self.region.is_some() || self.country.is_some()
    }

    /// Key used to decide whether two postings are in the same place.
    pub fn key(&self) -> String {
        if self.is_structured() {
            let part = |p: &Option<String>| p.as_deref().unwrap_or("").to_lowercase();
            format!(
                "{}|{}|{}|{}",
                part(&self.city),
                part(&self.region),
                part(&self.country),
                if self.remote { "remote" } else { "" }
            )
        } else {
            self.raw.to_lowercase()
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = [&self.city, &self.region, &self.country]
            .into_iter()
            .filter_map(|p| p.as_deref())
            .collect();

        match (parts.is_empty(), self.remote) {
            (true, true) => f.write_str("Remote"),
            (true, false) => f.write_str(&self.raw),
            (false, true) => write!(f, "Remote ({})", parts.join(", ")),
            (false, false) => f.write_str(&parts.join(", ")),
        }
    }
}

/// A posting in the source-agnostic schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CanonicalListing {
    /// Stable identifier derived from the duplicate key
    pub id: String,

    pub title: String,

    pub company: String,

    pub location: Location,

    #[serde(default)]
    pub salary: Option<SalaryRange>,

    #[serde(default)]
    pub description: String,

    /// Adapters that reported this posting
    pub sources: BTreeSet<String>,

    /// Earliest retrieval time among merged records
    pub first_seen: DateTime<Utc>,

    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub job_type: Option<String>,
}

impl CanonicalListing {
    /// Key shared by postings for the same position.
    pub fn duplicate_key(&self) -> String {
        duplicate_key(&self.title, &self.company, &self.location)
    }
}

/// Build the duplicate key from already-normalized parts.
pub fn duplicate_key(title: &str, company: &str, location: &Location) -> String {
    format!(
        "{}\u{1f}{}\u{1f}{}",
        title.to_lowercase(),
        company.to_lowercase(),
        location.key()
    )
}

/// Per-criterion scores, each in `[0, 100]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct ScoreBreakdown {
    pub relevance: f64,
    pub salary: f64,
    pub growth: f64,
    pub location: f64,
}

/// A scored posting with its position in the final order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankedListing {
    /// 1-based position
    pub rank: usize,

    pub score: f64,

    pub breakdown: ScoreBreakdown,

    pub listing: CanonicalListing,
}
