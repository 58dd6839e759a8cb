//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::selectors::ListingSelectors;
use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// What to search for
    #[serde(default)]
    pub search: SearchConfig,

    /// HTTP client, retry and scheduling behavior
    #[serde(default)]
    pub http: HttpConfig,

    /// Source adapter definitions
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Field normalization settings
    #[serde(default)]
    pub normalize: NormalizeConfig,

    /// Duplicate detection settings
    #[serde(default)]
    pub dedup: DedupConfig,

    /// Scoring weights and keywords
    #[serde(default)]
    pub ranking: RankingConfig,

    /// Insight generation settings
    #[serde(default)]
    pub report: ReportConfig,

    /// Artifact destination
    #[serde(default)]
    pub output: OutputConfig,
}

/// Upper bound for `http.timeout_secs`
pub const MAX_CALL_TIMEOUT_SECS: u64 = 3_600;
/// Upper bound for `http.run_timeout_secs`
pub const MAX_RUN_TIMEOUT_SECS: u64 = 86_400;
/// Upper bound for backoff and request spacing, in milliseconds
pub const MAX_DELAY_MS: u64 = 3_600_000;

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.search.terms.iter().all(|t| t.trim().is_empty()) {
            return Err(AppError::validation("search.terms is empty"));
        }
        if self.search.max_pages == 0 {
            return Err(AppError::validation("search.max_pages must be > 0"));
        }
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        if self.http.run_timeout_secs == 0 {
            return Err(AppError::validation("http.run_timeout_secs must be > 0"));
        }
        if self.http.timeout_secs > MAX_CALL_TIMEOUT_SECS {
            return Err(AppError::validation(format!(
                "http.timeout_secs must be <= {MAX_CALL_TIMEOUT_SECS}"
            )));
        }
        if self.http.run_timeout_secs > MAX_RUN_TIMEOUT_SECS {
            return Err(AppError::validation(format!(
                "http.run_timeout_secs must be <= {MAX_RUN_TIMEOUT_SECS}"
            )));
        }
        if self.http.backoff_max_ms > MAX_DELAY_MS || self.http.request_delay_ms > MAX_DELAY_MS {
            return Err(AppError::validation(format!(
                "http.backoff_max_ms and http.request_delay_ms must be <= {MAX_DELAY_MS}"
            )));
        }
        if self.http.max_attempts == 0 {
            return Err(AppError::validation("http.max_attempts must be > 0"));
        }
        if self.http.max_concurrent == 0 {
            return Err(AppError::validation("http.max_concurrent must be > 0"));
        }
        if self.http.backoff_base_ms > self.http.backoff_max_ms {
            return Err(AppError::validation(
                "http.backoff_base_ms must not exceed http.backoff_max_ms",
            ));
        }
        if self.sources.enabled_count() == 0 {
            return Err(AppError::validation("No sources enabled"));
        }
        for board in self.sources.boards.iter().filter(|b| b.enabled) {
            board.validate()?;
        }
        if self.normalize.default_currency.trim().len() != 3 {
            return Err(AppError::validation(
                "normalize.default_currency must be a 3-letter code",
            ));
        }
        let similarity = self.dedup.description_similarity;
        if !(similarity > 0.0 && similarity <= 1.0) {
            return Err(AppError::validation(
                "dedup.description_similarity must be in (0, 1]",
            ));
        }
        self.ranking.weights.validate()?;
        if self.report.enabled {
            if self.report.endpoint.trim().is_empty() {
                return Err(AppError::validation("report.endpoint is empty"));
            }
            if self.report.model.trim().is_empty() {
                return Err(AppError::validation("report.model is empty"));
            }
            if self.report.max_attempts == 0 {
                return Err(AppError::validation("report.max_attempts must be > 0"));
            }
        }
        Ok(())
    }
}

/// Search terms and locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Queries sent to every source
    #[serde(default = "defaults::terms")]
    pub terms: Vec<String>,

    /// Locations combined with each term
    #[serde(default = "defaults::locations")]
    pub locations: Vec<String>,

    /// Words that raise relevance when found in a posting
    #[serde(default)]
    pub keywords: Vec<String>,

    /// Page limit for paginated sources
    #[serde(default = "defaults::max_pages")]
    pub max_pages: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            terms: defaults::terms(),
            locations: defaults::locations(),
            keywords: Vec::new(),
            max_pages: defaults::max_pages(),
        }
    }
}

impl SearchConfig {
    /// Keywords used for relevance: explicit keywords, else the words of every term.
    pub fn relevance_keywords(&self) -> Vec<String> {
        let source: Vec<&String> = if self.keywords.is_empty() {
            self.terms.iter().collect()
        } else {
            self.keywords.iter().collect()
        };

        let mut out: Vec<String> = Vec::new();
        for entry in source {
            let words: Vec<String> = if self.keywords.is_empty() {
                entry.split_whitespace().map(str::to_lowercase).collect()
            } else {
                vec![entry.trim().to_lowercase()]
            };
            for w in words {
                if !w.is_empty() && !out.contains(&w) {
                    out.push(w);
                }
            }
        }
        out
    }
}

/// HTTP client and scheduling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Per-call timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Deadline for the whole collection phase in seconds
    #[serde(default = "defaults::run_timeout")]
    pub run_timeout_secs: u64,

    /// Attempts per call, including the first
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: u32,

    /// First backoff delay in milliseconds
    #[serde(default = "defaults::backoff_base")]
    pub backoff_base_ms: u64,

    /// Backoff ceiling in milliseconds
    #[serde(default = "defaults::backoff_max")]
    pub backoff_max_ms: u64,

    /// Minimum spacing between any two requests in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// Maximum adapters fetching at once
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            run_timeout_secs: defaults::run_timeout(),
            max_attempts: defaults::max_attempts(),
            backoff_base_ms: defaults::backoff_base(),
            backoff_max_ms: defaults::backoff_max(),
            request_delay_ms: defaults::request_delay(),
            max_concurrent: defaults::max_concurrent(),
        }
    }
}

/// Source adapter definitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default = "defaults::remotive")]
    pub remotive: ApiSourceConfig,

    #[serde(default = "defaults::remoteok")]
    pub remoteok: ApiSourceConfig,

    /// HTML job boards scraped with CSS selectors
    #[serde(default = "defaults::boards")]
    pub boards: Vec<BoardConfig>,

    /// Local JSON fixtures
    #[serde(default)]
    pub files: Vec<FileSourceConfig>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            remotive: defaults::remotive(),
            remoteok: defaults::remoteok(),
            boards: defaults::boards(),
            files: Vec::new(),
        }
    }
}

impl SourcesConfig {
    /// Number of enabled sources across every kind.
    pub fn enabled_count(&self) -> usize {
        usize::from(self.remotive.enabled)
            + usize::from(self.remoteok.enabled)
            + self.boards.iter().filter(|b| b.enabled).count()
            + self.files.iter().filter(|f| f.enabled).count()
    }

    /// Turn every network source off, leaving local files as they are.
    pub fn disable_network(&mut self) {
        self.remotive.enabled = false;
        self.remoteok.enabled = false;
        for board in &mut self.boards {
            board.enabled = false;
        }
    }
}

/// A JSON API source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSourceConfig {
    #[serde(default = "defaults::enabled")]
    pub enabled: bool,

    /// Scheme and host of the API
    pub base_url: String,
}

/// An HTML job board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Adapter name, used in source sets and logs
    pub name: String,

    #[serde(default = "defaults::enabled")]
    pub enabled: bool,

    /// Search URL with `{term}`, `{location}`, `{page}` and `{start}` placeholders
    pub search_url: String,

    /// Results per page, used to compute `{start}`
    #[serde(default = "defaults::page_size")]
    pub page_size: u32,

    /// Page limit for this board; falls back to `search.max_pages`
    #[serde(default)]
    pub max_pages: Option<u32>,

    #[serde(default)]
    pub selectors: ListingSelectors,
}

impl BoardConfig {
    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation("board name is empty"));
        }
        if !self.search_url.contains("{term}") {
            return Err(AppError::validation(format!(
                "board {}: search_url has no {{term}} placeholder",
                self.name
            )));
        }
        if self.page_size == 0 {
            return Err(AppError::validation(format!(
                "board {}: page_size must be > 0",
                self.name
            )));
        }
        for selector in self.selectors.all() {
            scraper::Selector::parse(selector)
                .map_err(|e| AppError::selector(selector, format!("{e:?}")))?;
        }
        Ok(())
    }
}

/// A local JSON file of raw listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileSourceConfig {
    pub name: String,

    #[serde(default = "defaults::enabled")]
    pub enabled: bool,

    pub path: PathBuf,
}

/// Field normalization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizeConfig {
    /// Currency assumed when a salary names none
    #[serde(default = "defaults::currency")]
    pub default_currency: String,

    /// Descriptions longer than this are cut at a word boundary
    #[serde(default = "defaults::max_description_chars")]
    pub max_description_chars: usize,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            default_currency: defaults::currency(),
            max_description_chars: defaults::max_description_chars(),
        }
    }
}

/// Duplicate detection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupConfig {
    /// Jaccard similarity at which two descriptions are the same posting
    #[serde(default = "defaults::description_similarity")]
    pub description_similarity: f64,

    /// Descriptions shorter than this never match by similarity
    #[serde(default = "defaults::min_description_words")]
    pub min_description_words: usize,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            description_similarity: defaults::description_similarity(),
            min_description_words: defaults::min_description_words(),
        }
    }
}

/// Scoring settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    #[serde(default)]
    pub weights: ScoreWeights,

    /// Words signalling career growth
    #[serde(default = "defaults::growth_keywords")]
    pub growth_keywords: Vec<String>,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            growth_keywords: defaults::growth_keywords(),
        }
    }
}

/// Weight of each sub-score in the final score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScoreWeights {
    #[serde(default = "defaults::relevance_weight")]
    pub relevance: f64,

    #[serde(default = "defaults::salary_weight")]
    pub salary: f64,

    #[serde(default = "defaults::growth_weight")]
    pub growth: f64,

    #[serde(default = "defaults::location_weight")]
    pub location: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            relevance: defaults::relevance_weight(),
            salary: defaults::salary_weight(),
            growth: defaults::growth_weight(),
            location: defaults::location_weight(),
        }
    }
}

impl ScoreWeights {
    fn validate(&self) -> Result<()> {
        let all = [self.relevance, self.salary, self.growth, self.location];
        if all.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(AppError::validation(
                "ranking.weights must be finite and non-negative",
            ));
        }
        if all.iter().sum::<f64>() <= 0.0 {
            return Err(AppError::validation("ranking.weights sum to zero"));
        }
        Ok(())
    }
}

/// Insight generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "defaults::enabled")]
    pub enabled: bool,

    /// OpenAI-compatible chat completions URL
    #[serde(default = "defaults::endpoint")]
    pub endpoint: String,

    #[serde(default = "defaults::model")]
    pub model: String,

    /// Environment variable holding the bearer key
    #[serde(default = "defaults::api_key_env")]
    pub api_key_env: String,

    /// Listings included verbatim in the prompt
    #[serde(default = "defaults::top_n")]
    pub top_n: usize,

    #[serde(default = "defaults::report_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "defaults::report_attempts")]
    pub max_attempts: u32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::enabled(),
            endpoint: defaults::endpoint(),
            model: defaults::model(),
            api_key_env: defaults::api_key_env(),
            top_n: defaults::top_n(),
            timeout_secs: defaults::report_timeout(),
            max_attempts: defaults::report_attempts(),
        }
    }
}

/// Artifact destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "defaults::output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: defaults::output_dir(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    use super::{ApiSourceConfig, BoardConfig, ListingSelectors};

    pub fn terms() -> Vec<String> {
        vec!["software engineer".to_string()]
    }
    pub fn locations() -> Vec<String> {
        vec!["Remote".to_string()]
    }
    pub fn max_pages() -> u32 {
        3
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36"
            .to_string()
    }
    pub fn timeout() -> u64 {
        10
    }
    pub fn run_timeout() -> u64 {
        300
    }
    pub fn max_attempts() -> u32 {
        3
    }
    pub fn backoff_base() -> u64 {
        500
    }
    pub fn backoff_max() -> u64 {
        8_000
    }
    pub fn request_delay() -> u64 {
        1_000
    }
    pub fn max_concurrent() -> usize {
        4
    }
    pub fn enabled() -> bool {
        true
    }
    pub fn page_size() -> u32 {
        10
    }
    pub fn remotive() -> ApiSourceConfig {
        ApiSourceConfig {
            enabled: true,
            base_url: "https://remotive.com".to_string(),
        }
    }
    pub fn remoteok() -> ApiSourceConfig {
        ApiSourceConfig {
            enabled: true,
            base_url: "https://remoteok.com".to_string(),
        }
    }
    pub fn boards() -> Vec<BoardConfig> {
        vec![
            BoardConfig {
                name: "indeed".to_string(),
                enabled: true,
                search_url: "https://www.indeed.com/jobs?q={term}&l={location}&start={start}"
                    .to_string(),
                page_size: 10,
                max_pages: None,
                selectors: ListingSelectors::indeed(),
            },
            BoardConfig {
                name: "weworkremotely".to_string(),
                enabled: true,
                search_url: "https://weworkremotely.com/remote-jobs/search?term={term}"
                    .to_string(),
                page_size: 100,
                max_pages: Some(1),
                selectors: ListingSelectors::weworkremotely(),
            },
            BoardConfig {
                name: "linkedin".to_string(),
                enabled: true,
                search_url:
                    "https://www.linkedin.com/jobs/search?keywords={term}&location={location}&start={start}"
                        .to_string(),
                page_size: 25,
                max_pages: None,
                selectors: ListingSelectors::linkedin(),
            },
            BoardConfig {
                name: "glassdoor".to_string(),
                enabled: true,
                search_url: "https://www.glassdoor.com/Job/jobs.htm?sc.keyword={term}&locT=C&locId=1&p={page}"
                    .to_string(),
                page_size: 30,
                max_pages: None,
                selectors: ListingSelectors::glassdoor(),
            },
            // Dice serves most cards from script; off unless asked for
            BoardConfig {
                name: "dice".to_string(),
                enabled: false,
                search_url: "https://www.dice.com/jobs?q={term}&location={location}&page={page}"
                    .to_string(),
                page_size: 20,
                max_pages: None,
                selectors: ListingSelectors::dice(),
            },
        ]
    }
    pub fn currency() -> String {
        "USD".to_string()
    }
    pub fn max_description_chars() -> usize {
        2_000
    }
    pub fn description_similarity() -> f64 {
        0.85
    }
    pub fn min_description_words() -> usize {
        20
    }
    pub fn growth_keywords() -> Vec<String> {
        [
            "ai",
            "machine learning",
            "cloud",
            "aws",
            "kubernetes",
            "react",
            "python",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }
    pub fn relevance_weight() -> f64 {
        0.4
    }
    pub fn salary_weight() -> f64 {
        0.3
    }
    pub fn growth_weight() -> f64 {
        0.2
    }
    pub fn location_weight() -> f64 {
        0.1
    }
    pub fn endpoint() -> String {
        "https://api.openai.com/v1/chat/completions".to_string()
    }
    pub fn model() -> String {
        "gpt-4o-mini".to_string()
    }
    pub fn api_key_env() -> String {
        "OPENAI_API_KEY".to_string()
    }
    pub fn top_n() -> usize {
        20
    }
    pub fn report_timeout() -> u64 {
        60
    }
    pub fn report_attempts() -> u32 {
        2
    }
    pub fn output_dir() -> PathBuf {
        PathBuf::from("output")
    }
}
