//! Storage abstractions for run artifacts.
//!
//! Each run writes two files into the output directory:
//!
//! ```text
//! output/
//! ├── jobs_{term}_{location}_{YYYYmmdd_HHMMSS}.csv   # ranked export
//! └── insights_{term}_{YYYYmmdd_HHMMSS}.txt          # market insight report
//! ```

pub mod local;

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::RankedListing;

// Re-export for convenience
pub use local::{ExportRecord, LocalStorage, load_export, read_export, write_export};

/// Trait for artifact storage backends.
#[async_trait]
pub trait ReportStorage: Send + Sync {
    /// Make sure artifacts can be written. Called before any fetching.
    async fn prepare(&self) -> Result<()>;

    /// Write the ranked export under `name`.
    async fn write_listings(&self, name: &str, listings: &[RankedListing]) -> Result<PathBuf>;

    /// Write the insight report under `name`.
    async fn write_insight(&self, name: &str, text: &str) -> Result<PathBuf>;
}
