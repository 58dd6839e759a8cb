// src/pipeline/rank.rs

//! Deterministic weighted scoring.

use std::cmp::Ordering;

use unicode_segmentation::UnicodeSegmentation;

use crate::models::{
    CanonicalListing, RankedListing, RankingConfig, ScoreBreakdown, ScoreWeights, SearchConfig,
};

const TITLE_HIT: f64 = 15.0;
const COMPANY_HIT: f64 = 8.0;
const DESCRIPTION_HIT: f64 = 5.0;

const SALARY_PRESENT: f64 = 40.0;
/// Annual midpoint floor and bonus, highest first.
const SALARY_TIERS: &[(f64, f64)] = &[
    (200_000.0, 60.0),
    (150_000.0, 50.0),
    (120_000.0, 40.0),
    (90_000.0, 25.0),
    (60_000.0, 10.0),
];

const SENIOR_WORDS: &[&str] = &["senior", "lead", "principal"];
const MID_WORDS: &[&str] = &["mid", "intermediate"];
const SENIOR_BONUS: f64 = 15.0;
const MID_BONUS: f64 = 10.0;
const GROWTH_HIT: f64 = 5.0;

const LOCATION_HIT: f64 = 30.0;
const REMOTE_BONUS: f64 = 40.0;

const MAX_SUB_SCORE: f64 = 100.0;

/// Lowercased words of `text`, space-separated and space-padded.
///
/// Terms are matched as whole word sequences against this form, so
/// `ai` does not hit `maintain`.
pub fn word_form(text: &str) -> String {
    let words: Vec<String> = text.unicode_words().map(str::to_lowercase).collect();
    format!(" {} ", words.join(" "))
}

fn padded_terms<'a>(terms: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for term in terms {
        let form = word_form(term);
        if !form.trim().is_empty() && !out.contains(&form) {
            out.push(form);
        }
    }
    out
}

pub struct Ranker {
    keywords: Vec<String>,
    locations: Vec<String>,
    growth_keywords: Vec<String>,
    weights: ScoreWeights,
}

impl Ranker {
    pub fn new(search: &SearchConfig, ranking: &RankingConfig) -> Self {
        let keywords = search.relevance_keywords();
        Self {
            keywords: padded_terms(keywords.iter().map(String::as_str)),
            locations: padded_terms(search.locations.iter().flat_map(|l| l.split(','))),
            growth_keywords: padded_terms(ranking.growth_keywords.iter().map(String::as_str)),
            weights: ranking.weights,
        }
    }

    /// Per-criterion scores of one listing.
    pub fn breakdown(&self, listing: &CanonicalListing) -> ScoreBreakdown {
        let title = word_form(&listing.title);
        let company = word_form(&listing.company);
        let description = word_form(&listing.description);

        ScoreBreakdown {
            relevance: self.relevance(&title, &company, &description),
            salary: salary_score(listing),
            growth: self.growth(&title, &description),
            location: self.location(listing),
        }
    }

    fn relevance(&self, title: &str, company: &str, description: &str) -> f64 {
        let total: f64 = self
            .keywords
            .iter()
            .map(|k| {
                let mut s = 0.0;
                if title.contains(k.as_str()) {
                    s += TITLE_HIT;
                }
                if company.contains(k.as_str()) {
                    s += COMPANY_HIT;
                }
                if description.contains(k.as_str()) {
                    s += DESCRIPTION_HIT;
                }
                s
            })
            .sum();
        total.min(MAX_SUB_SCORE)
    }

    fn growth(&self, title: &str, description: &str) -> f64 {
        let mut score = 0.0;
        let has_word = |w: &&str| title.contains(&format!(" {w} "));
        if SENIOR_WORDS.iter().any(has_word) {
            score += SENIOR_BONUS;
        } else if MID_WORDS.iter().any(has_word) {
            score += MID_BONUS;
        }

        score += self
            .growth_keywords
            .iter()
            .filter(|k| title.contains(k.as_str()) || description.contains(k.as_str()))
            .count() as f64
            * GROWTH_HIT;
        score.min(MAX_SUB_SCORE)
    }

    fn location(&self, listing: &CanonicalListing) -> f64 {
        let text = word_form(&format!("{} {}", listing.location.raw, listing.location));
        let mut score = self
            .locations
            .iter()
            .filter(|l| text.contains(l.as_str()))
            .count() as f64
            * LOCATION_HIT;
        if listing.location.remote {
            score += REMOTE_BONUS;
        }
        score.min(MAX_SUB_SCORE)
    }

    /// Weighted sum of the sub-scores.
    pub fn total(&self, b: &ScoreBreakdown) -> f64 {
        b.relevance * self.weights.relevance
            + b.salary * self.weights.salary
            + b.growth * self.weights.growth
            + b.location * self.weights.location
    }

    /// Score and order listings; ranks are 1-based.
    pub fn rank(&self, listings: Vec<CanonicalListing>) -> Vec<RankedListing> {
        let mut ranked: Vec<RankedListing> = listings
            .into_iter()
            .map(|listing| {
                let breakdown = self.breakdown(&listing);
                RankedListing {
                    rank: 0,
                    score: self.total(&breakdown),
                    breakdown,
                    listing,
                }
            })
            .collect();

        ranked.sort_by(rank_order);
        for (i, r) in ranked.iter_mut().enumerate() {
            r.rank = i + 1;
        }

        log::info!("Ranked {} listings", ranked.len());
        ranked
    }
}

/// Score descending, then most recent first, then id ascending.
pub fn rank_order(a: &RankedListing, b: &RankedListing) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| b.listing.first_seen.cmp(&a.listing.first_seen))
        .then_with(|| a.listing.id.cmp(&b.listing.id))
}

fn salary_score(listing: &CanonicalListing) -> f64 {
    let Some(salary) = &listing.salary else {
        return 0.0;
    };
    let mid = salary.midpoint();
    let bonus = SALARY_TIERS
        .iter()
        .find(|(floor, _)| mid >= *floor)
        .map_or(0.0, |(_, bonus)| *bonus);
    (SALARY_PRESENT + bonus).min(MAX_SUB_SCORE)
}
