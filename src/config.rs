// src/config.rs

//! Configuration loading and command-line overrides.
//!
//! The loaded value is frozen into an `Arc` before the pipeline starts.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::Result;
use crate::models::Config;

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "jobhunt.toml";

/// Load configuration from a TOML file.
///
/// A missing file falls back to defaults; a file that exists but does not
/// parse is an error.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        log::warn!(
            "Config file {} not found. Using default configuration.",
            path.display()
        );
        return Ok(Config::default());
    }
    let config = Config::load(path)?;
    log::info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Values given on the command line, applied over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub terms: Vec<String>,
    pub locations: Vec<String>,
    pub keywords: Vec<String>,
    pub no_ai: bool,
    /// Keep only local file sources
    pub offline: bool,
    pub output_dir: Option<PathBuf>,
}

impl Overrides {
    /// Apply the overrides. Non-empty lists replace the configured ones.
    pub fn apply(self, config: &mut Config) {
        if !self.terms.is_empty() {
            config.search.terms = self.terms;
        }
        if !self.locations.is_empty() {
            config.search.locations = self.locations;
        }
        if !self.keywords.is_empty() {
            config.search.keywords = self.keywords;
        }
        if self.no_ai {
            config.report.enabled = false;
        }
        if self.offline {
            config.sources.disable_network();
        }
        if let Some(dir) = self.output_dir {
            config.output.dir = dir;
        }
    }
}

/// Load, override, validate and freeze.
pub fn prepare_config(path: &Path, overrides: Overrides) -> Result<Arc<Config>> {
    let mut config = load_config(path)?;
    overrides.apply(&mut config);
    config.validate()?;
    Ok(Arc::new(config))
}
