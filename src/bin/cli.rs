//! jobhunt CLI
//!
//! Local execution entry point.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use jobhunt::{
    config::{DEFAULT_CONFIG_FILE, Overrides, load_config, prepare_config},
    error::Result,
    models::{Config, RunSummary},
    pipeline,
    services::{build_adapters, build_generator},
    storage::{LocalStorage, load_export},
    utils::http,
};

/// jobhunt - Job Board Aggregator
#[derive(Parser, Debug)]
#[command(
    name = "jobhunt",
    version,
    about = "Scrape job boards, merge duplicates and rank the results"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Collect, rank and report
    Run {
        /// Search term (repeatable, replaces the configured terms)
        #[arg(short, long = "term")]
        terms: Vec<String>,

        /// Search location (repeatable)
        #[arg(short, long = "location")]
        locations: Vec<String>,

        /// Relevance keyword (repeatable)
        #[arg(short, long = "keyword")]
        keywords: Vec<String>,

        /// Skip the market insight report
        #[arg(long)]
        no_ai: bool,

        /// Use only local file sources
        #[arg(long)]
        offline: bool,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate the configuration file
    Validate,

    /// List configured sources
    Sources,

    /// Print the top rows of an export
    Show {
        /// CSV export written by `run`
        csv: PathBuf,

        /// Number of rows to print
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Run {
            terms,
            locations,
            keywords,
            no_ai,
            offline,
            output,
        } => {
            let overrides = Overrides {
                terms,
                locations,
                keywords,
                no_ai,
                offline,
                output_dir: output,
            };
            let config = prepare_config(&cli.config, overrides)?;

            let client = http::create_async_client(&config.http)?;
            let adapters = build_adapters(&config, &client)?;
            let generator = build_generator(&config.report)?;
            let storage = LocalStorage::new(&config.output.dir);

            let summary = pipeline::run_pipeline(
                config.clone(),
                &adapters,
                &storage,
                generator.as_deref(),
            )
            .await?;
            print_summary(&summary);
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            let config = load_config(&cli.config)?;
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            println!("Configuration OK");
            println!("  Terms:     {}", config.search.terms.join(", "));
            println!("  Locations: {}", display_list(&config.search.locations));
            println!("  Sources:   {} enabled", config.sources.enabled_count());
            println!(
                "  Insights:  {}",
                if config.report.enabled {
                    config.report.model.as_str()
                } else {
                    "disabled"
                }
            );
            println!("  Output:    {}", config.output.dir.display());
        }

        Command::Sources => {
            let config = load_config(&cli.config)?;
            print_sources(&config);
        }

        Command::Show { csv, top } => {
            let listings = load_export(&csv)?;
            println!("{} listings in {}", listings.len(), csv.display());
            for r in listings.iter().take(top) {
                let l = &r.listing;
                println!(
                    "{:>3}. [{:>5.1}] {} | {} | {} | {}",
                    r.rank,
                    r.score,
                    l.title,
                    if l.company.is_empty() { "-" } else { l.company.as_str() },
                    l.location,
                    l.salary
                        .as_ref()
                        .map_or_else(|| "no salary".to_string(), |s| s.to_string())
                );
            }
        }
    }

    Ok(())
}

fn display_list(items: &[String]) -> String {
    if items.is_empty() {
        "(any)".to_string()
    } else {
        items.join(", ")
    }
}

fn print_sources(config: &Config) {
    let mark = |enabled: bool| if enabled { "on " } else { "off" };
    let s = &config.sources;
    println!("[{}] remotive  {}", mark(s.remotive.enabled), s.remotive.base_url);
    println!("[{}] remoteok  {}", mark(s.remoteok.enabled), s.remoteok.base_url);
    for board in &s.boards {
        println!("[{}] {}  {}", mark(board.enabled), board.name, board.search_url);
    }
    for file in &s.files {
        println!("[{}] {}  {}", mark(file.enabled), file.name, file.path.display());
    }
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!("Sources:");
    for s in &summary.sources {
        let status = match (&s.error, s.cancelled) {
            (_, true) => "cancelled".to_string(),
            (Some(e), _) => format!("failed: {e}"),
            (None, false) => "ok".to_string(),
        };
        println!(
            "  {:<16} {:>4} listings, {:>3} pages, {:>3} skipped, {:>2} failed attempts  {}",
            s.source, s.fetched, s.pages, s.skipped, s.failed_attempts, status
        );
    }
    println!();
    println!(
        "Collected {}, skipped {}, dropped {}, merged {}, ranked {} ({} warnings)",
        summary.collected,
        summary.skipped(),
        summary.dropped,
        summary.merged,
        summary.ranked,
        summary.warnings
    );
    if let Some(path) = &summary.export_path {
        println!("Export:   {}", path.display());
    }
    match (&summary.insight_path, &summary.insight_error) {
        (Some(path), _) => println!("Insights: {}", path.display()),
        (None, Some(e)) => println!("Insights: not written ({e})"),
        (None, None) => {}
    }
}
