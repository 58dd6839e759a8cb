// src/pipeline/dedup.rs

//! Duplicate detection across sources.
//!
//! Two listings are the same posting when their duplicate keys match or
//! their descriptions are near-identical. Groups are the transitive closure
//! of that relation, so the result does not depend on input order.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use unicode_segmentation::UnicodeSegmentation;

use crate::models::{CanonicalListing, DedupConfig, Location, SalaryRange};

/// Disjoint-set forest over listing indices.
struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            Ordering::Less => self.parent[ra] = rb,
            Ordering::Greater => self.parent[rb] = ra,
            Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
    }
}

/// Lowercased word set of a description.
pub fn word_set(text: &str) -> BTreeSet<String> {
    text.unicode_words().map(|w| w.to_lowercase()).collect()
}

/// Jaccard similarity of two word sets; 0 when both are empty.
pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

fn salary_order(a: Option<&SalaryRange>, b: Option<&SalaryRange>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => a
            .min
            .total_cmp(&b.min)
            .then_with(|| a.max.total_cmp(&b.max))
            .then_with(|| a.currency.cmp(&b.currency))
            .then_with(|| a.period.cmp(&b.period)),
    }
}

fn location_order(a: &Location, b: &Location) -> Ordering {
    a.raw
        .cmp(&b.raw)
        .then_with(|| a.city.cmp(&b.city))
        .then_with(|| a.region.cmp(&b.region))
        .then_with(|| a.country.cmp(&b.country))
        .then_with(|| a.remote.cmp(&b.remote))
}

/// Representative order: earliest first, then lowest id, then content.
///
/// Total over every field, so the representative never depends on input
/// order.
fn representative_order(a: &CanonicalListing, b: &CanonicalListing) -> Ordering {
    a.first_seen
        .cmp(&b.first_seen)
        .then_with(|| a.id.cmp(&b.id))
        .then_with(|| a.sources.cmp(&b.sources))
        .then_with(|| a.url.cmp(&b.url))
        .then_with(|| a.description.cmp(&b.description))
        .then_with(|| a.title.cmp(&b.title))
        .then_with(|| a.company.cmp(&b.company))
        .then_with(|| salary_order(a.salary.as_ref(), b.salary.as_ref()))
        .then_with(|| location_order(&a.location, &b.location))
        .then_with(|| a.job_type.cmp(&b.job_type))
}

pub struct Deduplicator {
    similarity: f64,
    min_words: usize,
}

impl Deduplicator {
    pub fn new(config: &DedupConfig) -> Self {
        Self {
            similarity: config.description_similarity,
            min_words: config.min_description_words,
        }
    }

    /// Merge duplicates. Output is sorted by canonical id.
    pub fn dedup(&self, listings: Vec<CanonicalListing>) -> Vec<CanonicalListing> {
        let n = listings.len();
        let mut uf = UnionFind::new(n);

        let mut by_key: HashMap<String, usize> = HashMap::new();
        for (i, listing) in listings.iter().enumerate() {
            match by_key.get(&listing.duplicate_key()) {
                Some(&j) => uf.union(i, j),
                None => {
                    by_key.insert(listing.duplicate_key(), i);
                }
            }
        }

        let words: Vec<Option<BTreeSet<String>>> = listings
            .iter()
            .map(|l| {
                let set = word_set(&l.description);
                (set.len() >= self.min_words.max(1)).then_some(set)
            })
            .collect();
        for i in 0..n {
            let Some(a) = &words[i] else { continue };
            for j in (i + 1)..n {
                let Some(b) = &words[j] else { continue };
                if jaccard(a, b) >= self.similarity {
                    uf.union(i, j);
                }
            }
        }

        let mut groups: HashMap<usize, Vec<CanonicalListing>> = HashMap::new();
        for (i, listing) in listings.into_iter().enumerate() {
            groups.entry(uf.find(i)).or_default().push(listing);
        }

        let mut merged: Vec<CanonicalListing> = groups.into_values().filter_map(merge).collect();
        merged.sort_by(|a, b| a.id.cmp(&b.id).then_with(|| representative_order(a, b)));

        log::info!(
            "Deduplicated {} listings into {} ({} merged)",
            n,
            merged.len(),
            n - merged.len()
        );
        merged
    }
}

/// Fold a duplicate group into its representative.
fn merge(mut members: Vec<CanonicalListing>) -> Option<CanonicalListing> {
    members.sort_by(representative_order);
    let mut iter = members.into_iter();
    let mut rep = iter.next()?;

    for other in iter {
        rep.sources.extend(other.sources);
        if rep.salary.is_none() {
            rep.salary = other.salary;
        }
        if rep.url.is_none() {
            rep.url = other.url;
        }
        if rep.job_type.is_none() {
            rep.job_type = other.job_type;
        }
        if rep.description.is_empty() {
            rep.description = other.description;
        }
        if rep.company.is_empty() {
            rep.company = other.company;
        }
        if other.first_seen < rep.first_seen {
            rep.first_seen = other.first_seen;
        }
    }
    Some(rep)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SalaryPeriod;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap()
    }

    fn listing(id: &str, title: &str, source: &str, hour: u32, description: &str) -> CanonicalListing {
        CanonicalListing {
            id: id.into(),
            title: title.into(),
            company: "Acme".into(),
            location: Location::unresolved("Remote"),
            salary: None,
            description: description.into(),
            sources: BTreeSet::from([source.to_string()]),
            first_seen: at(hour),
            url: None,
            job_type: None,
        }
    }

    fn config() -> DedupConfig {
        DedupConfig {
            description_similarity: 0.8,
            min_description_words: 5,
        }
    }

    const LONG: &str = "We are hiring a backend engineer to build reliable distributed services in Rust";

    #[test]
    fn test_exact_key_merges_and_unions_sources() {
        let mut a = listing("aaaa", "Software Engineer", "indeed", 10, "");
        let mut b = listing("aaaa", "software engineer", "remotive", 8, "Full description");
        a.salary = Some(SalaryRange::annualized(100_000.0, 120_000.0, "USD", SalaryPeriod::Year));
        b.url = Some("https://remotive.com/job/1".into());

        let out = Deduplicator::new(&config()).dedup(vec![a, b]);
        assert_eq!(out.len(), 1);
        let merged = &out[0];
        // earliest member represents the group
        assert_eq!(merged.title, "software engineer");
        assert_eq!(merged.first_seen, at(8));
        assert_eq!(merged.sources.len(), 2);
        assert_eq!(merged.salary.as_ref().map(|s| s.min), Some(100_000.0));
        assert_eq!(merged.url.as_deref(), Some("https://remotive.com/job/1"));
        assert_eq!(merged.description, "Full description");
    }

    #[test]
    fn test_similar_descriptions_merge_transitively() {
        let a = listing("a1", "Backend Engineer", "x", 1, LONG);
        let b = listing("b2", "Rust Backend Dev", "y", 2, &format!("{LONG} today"));
        let c = listing("c3", "Engineer (Rust)", "z", 3, &format!("{LONG} today now"));
        let d = listing("d4", "Designer", "w", 4, "Create delightful interfaces for our mobile apps and web");

        let out = Deduplicator::new(&config()).dedup(vec![c, d, a, b]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].id, "a1");
        assert_eq!(out[0].sources.len(), 3);
        assert_eq!(out[1].id, "d4");
    }

    #[test]
    fn test_short_descriptions_never_match() {
        let a = listing("a1", "One", "x", 1, "Same short text");
        let b = listing("b2", "Two", "y", 2, "Same short text");
        let out = Deduplicator::new(&config()).dedup(vec![a, b]);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_order_invariant() {
        let items = vec![
            listing("k1", "Engineer", "a", 5, LONG),
            listing("k1", "engineer", "b", 3, ""),
            listing("k2", "Analyst", "c", 4, &format!("{LONG} extra")),
            listing("k3", "Manager", "d", 2, "Lead a team of five people across two product lines"),
            listing("k4", "Manager", "e", 2, "Short"),
        ];
        let dedup = Deduplicator::new(&config());
        let forward = dedup.dedup(items.clone());

        let mut reversed = items.clone();
        reversed.reverse();
        assert_eq!(dedup.dedup(reversed), forward);

        let mut rotated = items;
        rotated.rotate_left(2);
        assert_eq!(dedup.dedup(rotated), forward);
    }

    #[test]
    fn test_salary_breaks_representative_ties() {
        let mut a = listing("same", "Engineer", "indeed", 1, "");
        let mut b = a.clone();
        a.salary = Some(SalaryRange::annualized(100_000.0, 100_000.0, "USD", SalaryPeriod::Year));
        b.salary = Some(SalaryRange::annualized(150_000.0, 150_000.0, "USD", SalaryPeriod::Year));
        let mut c = a.clone();
        c.salary = None;
        c.job_type = Some("Full-time".into());

        let dedup = Deduplicator::new(&config());
        let forward = dedup.dedup(vec![a.clone(), b.clone(), c.clone()]);
        assert_eq!(forward.len(), 1);
        assert_eq!(forward[0].salary.as_ref().map(|s| s.min), Some(100_000.0));
        assert_eq!(dedup.dedup(vec![b.clone(), a.clone(), c.clone()]), forward);
        assert_eq!(dedup.dedup(vec![c, b, a]), forward);
    }

    #[test]
    fn test_location_breaks_representative_ties() {
        let a = listing("same", "Engineer", "indeed", 1, "");
        let mut b = a.clone();
        b.location.city = Some("Austin".into());

        let dedup = Deduplicator::new(&config());
        let forward = dedup.dedup(vec![a.clone(), b.clone()]);
        assert_eq!(dedup.dedup(vec![b, a]), forward);
        assert_eq!(forward[0].location.city, None);
    }

    #[test]
    fn test_jaccard() {
        let a = word_set("Rust rust TOKIO");
        let b = word_set("rust serde");
        assert_eq!(a.len(), 2);
        assert!((jaccard(&a, &b) - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(jaccard(&BTreeSet::new(), &BTreeSet::new()), 0.0);
    }
}
