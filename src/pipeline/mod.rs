//! Pipeline stages and the run entry point.
//!
//! - `collect`: fetch raw listings from every adapter concurrently
//! - `normalize`: map raw listings into the canonical schema
//! - `dedup`: merge postings seen on several sources
//! - `rank`: weighted scoring and ordering
//! - `report`: CSV export and market insight text
//! - `run`: wire the stages together

pub mod collect;
pub mod dedup;
pub mod normalize;
pub mod rank;
pub mod report;
pub mod run;

pub use collect::{CollectOptions, SourceOutcome, collect};
pub use dedup::Deduplicator;
pub use normalize::Normalizer;
pub use rank::Ranker;
pub use report::{MarketStats, ReportContext, ReportOutcome, write_reports};
pub use run::run_pipeline;
