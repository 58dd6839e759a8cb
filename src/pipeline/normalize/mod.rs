//! Raw listing to canonical listing.
//!
//! Each field goes through its own parser; a record is dropped only when
//! it has no title.

mod location;
mod salary;
mod text;

use std::collections::BTreeSet;

use sha2::{Digest, Sha256};

use crate::error::{AppError, Result};
use crate::models::{CanonicalListing, NormalizeConfig, RawListing, duplicate_key};

pub use location::{LocationParser, LocationStrategy, known_country, us_state};
pub use salary::{RangeStrategy, SalaryParser, SalaryStrategy, SingleStrategy};
pub use text::{clean_text, collapse_whitespace, truncate_words};

/// Maps raw listings into the canonical schema.
pub struct Normalizer {
    salary: SalaryParser,
    location: LocationParser,
    max_description_chars: usize,
}

impl Normalizer {
    pub fn new(config: &NormalizeConfig) -> Result<Self> {
        Ok(Self {
            salary: SalaryParser::new(&config.default_currency)?,
            location: LocationParser::new()?,
            max_description_chars: config.max_description_chars,
        })
    }

    /// Normalize one record.
    pub fn normalize(&self, raw: &RawListing) -> Result<CanonicalListing> {
        let title = clean_text(&raw.title);
        if title.is_empty() {
            return Err(AppError::normalization(format!(
                "{} record {} has no title",
                raw.source,
                raw.source_id.as_deref().unwrap_or("?")
            )));
        }

        let company = clean_text(&raw.company);
        let location = self.location.parse(&clean_text(&raw.location));
        let full_description = clean_text(&raw.description);

        let salary_text = clean_text(&raw.salary);
        let salary = self
            .salary
            .parse(&salary_text)
            .or_else(|| self.salary.parse_description(&full_description));

        let description = truncate_words(&full_description, self.max_description_chars);
        let id = canonical_id(&duplicate_key(&title, &company, &location));

        Ok(CanonicalListing {
            id,
            title,
            company,
            location,
            salary,
            description,
            sources: BTreeSet::from([raw.source.clone()]),
            first_seen: raw.retrieved_at,
            url: raw
                .url
                .as_deref()
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .map(str::to_string),
            job_type: text::non_empty(clean_text(raw.job_type.as_deref().unwrap_or(""))),
        })
    }

    /// Normalize a batch, dropping failures. Returns the listings and the drop count.
    pub fn normalize_all(&self, raws: &[RawListing]) -> (Vec<CanonicalListing>, usize) {
        let mut out = Vec::with_capacity(raws.len());
        let mut dropped = 0;
        for raw in raws {
            match self.normalize(raw) {
                Ok(listing) => out.push(listing),
                Err(e) => {
                    dropped += 1;
                    log::warn!("Dropping record: {e}");
                }
            }
        }
        log::info!(
            "Normalized {} listings ({} dropped)",
            out.len(),
            dropped
        );
        (out, dropped)
    }
}

/// First 16 hex characters of the SHA-256 of `key`.
pub fn canonical_id(key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    hex::encode(digest)[..16].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn raw(source: &str, title: &str, company: &str, salary: &str) -> RawListing {
        RawListing {
            source: source.into(),
            source_id: None,
            title: title.into(),
            company: company.into(),
            location: "Remote".into(),
            salary: salary.into(),
            description: String::new(),
            url: None,
            job_type: None,
            search_term: "engineer".into(),
            search_location: String::new(),
            retrieved_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
        }
    }

    fn normalizer() -> Normalizer {
        Normalizer::new(&NormalizeConfig::default()).unwrap()
    }

    #[test]
    fn test_same_posting_same_id() {
        let n = normalizer();
        let a = n
            .normalize(&raw("indeed", "Software Engineer", "Acme", "$100k-$120k"))
            .unwrap();
        let b = n
            .normalize(&raw("remotive", "software  engineer", "ACME", "100,000-120,000 USD/yr"))
            .unwrap();

        assert_eq!(a.id, b.id);
        assert_eq!(a.id.len(), 16);
        assert_eq!(a.salary, b.salary);
        assert_eq!(a.sources, BTreeSet::from(["indeed".to_string()]));
    }

    #[test]
    fn test_missing_title_fails() {
        let err = normalizer()
            .normalize(&raw("indeed", "  <b> </b> ", "Acme", ""))
            .unwrap_err();
        assert!(matches!(err, AppError::Normalization(_)));
    }

    #[test]
    fn test_salary_falls_back_to_description() {
        let mut r = raw("indeed", "Data Engineer", "Beta", "Not specified");
        r.description = "<p>Pay: $90,000 - $110,000 a year</p>".into();
        let listing = normalizer().normalize(&r).unwrap();
        let salary = listing.salary.unwrap();
        assert_eq!((salary.min, salary.max), (90_000.0, 110_000.0));
        assert_eq!(listing.description, "Pay: $90,000 - $110,000 a year");
    }

    #[test]
    fn test_unparsable_salary_is_absent() {
        let listing = normalizer()
            .normalize(&raw("indeed", "Engineer", "Acme", "Competitive"))
            .unwrap();
        assert!(listing.salary.is_none());
        assert!(listing.location.remote);
    }

    #[test]
    fn test_normalize_all_counts_drops() {
        let raws = vec![
            raw("a", "Engineer", "Acme", ""),
            raw("a", "", "Acme", ""),
            raw("b", "N/A", "Acme", ""),
        ];
        let (listings, dropped) = normalizer().normalize_all(&raws);
        assert_eq!(listings.len(), 1);
        assert_eq!(dropped, 2);
    }
}
