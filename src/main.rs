//! Promstep CLI
//!
//! Command-line interface for query resolution:
//! - Resolve a query request into executable queries
//! - Classify a result frame's metadata
//! - Print a default config file

use anyhow::Context;
use clap::{Parser, Subcommand};
use promstep::config::{generate_default_config, Config, LoggingConfig};
use promstep::query::{AlignedTimeRange, FrameMeta, QueryRequest, ResolvedQuery};
use promstep::format_duration;
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "promstep")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Resolve Prometheus dashboard queries into executable queries")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve a query request (JSON file, or stdin when omitted)
    Resolve {
        /// Path to the request JSON
        input: Option<PathBuf>,
        /// Resolve as the alerting engine would (no exemplars)
        #[arg(long)]
        alert: bool,
        /// Override the datasource scrape interval
        #[arg(long)]
        scrape_interval: Option<String>,
    },

    /// Print the result kind for frame metadata JSON (file, or stdin when omitted)
    Classify {
        /// Path to the metadata JSON
        input: Option<PathBuf>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// A resolved query with its aligned window, as printed by `resolve`
#[derive(Serialize)]
struct ResolvedOutput<'a> {
    #[serde(flatten)]
    query: &'a ResolvedQuery,
    aligned: AlignedTimeRange,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging is configured by the file being loaded, so loading runs under a
    // stderr subscriber of its own
    let bootstrap = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .finish();
    let (mut config, source) =
        tracing::subscriber::with_default(bootstrap, || load_config(cli.config.as_deref()))?;

    init_logging(&config.logging);
    match &source {
        Some(path) => tracing::info!("Loaded config from {:?}", path),
        None => tracing::info!("Using default config with environment overrides"),
    }

    match cli.command {
        Commands::Resolve {
            input,
            alert,
            scrape_interval,
        } => {
            if let Some(interval) = scrape_interval {
                config.datasource.time_interval = interval;
            }
            resolve(&config, input.as_deref(), alert, &cli.format)
        }
        Commands::Classify { input } => {
            let text = read_input(input.as_deref())?;
            let custom: serde_json::Value =
                serde_json::from_str(&text).context("parsing metadata JSON")?;
            let meta = FrameMeta {
                custom: Some(custom),
            };
            println!("{}", meta.result_kind());
            Ok(())
        }
        Commands::Config { output } => {
            let content = generate_default_config();
            match output {
                Some(path) => {
                    std::fs::write(&path, content)
                        .with_context(|| format!("writing config to {:?}", path))?;
                    tracing::info!("Wrote default config to {:?}", path);
                }
                None => print!("{}", content),
            }
            Ok(())
        }
    }
}

fn resolve(config: &Config, input: Option<&Path>, alert: bool, format: &str) -> anyhow::Result<()> {
    let resolver = config.resolver().context("building query resolver")?;

    let text = read_input(input)?;
    let mut request: QueryRequest =
        serde_json::from_str(&text).context("parsing query request")?;
    if alert {
        request
            .headers
            .insert("FromAlert".to_string(), "true".to_string());
    }

    tracing::info!(
        queries = request.queries.len(),
        scrape_interval = resolver.scrape_interval(),
        "Resolving query request"
    );

    let resolved = resolver.resolve_request(&request)?;
    let aligned = resolved
        .iter()
        .map(|q| q.time_range())
        .collect::<Result<Vec<_>, _>>()?;

    match format {
        "json" => {
            let output: Vec<ResolvedOutput> = resolved
                .iter()
                .zip(aligned)
                .map(|(query, aligned)| ResolvedOutput { query, aligned })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        _ => print_table(&resolved, &aligned),
    }

    Ok(())
}

fn print_table(resolved: &[ResolvedQuery], aligned: &[AlignedTimeRange]) {
    println!(
        "{:<6} {:<10} {:<18} {:<26} {:<26} EXPR",
        "REF", "STEP", "KIND", "START", "END"
    );
    for (query, range) in resolved.iter().zip(aligned) {
        let mut kinds = Vec::new();
        if query.range_query {
            kinds.push("range");
        }
        if query.instant_query {
            kinds.push("instant");
        }
        if query.exemplar_query {
            kinds.push("exemplar");
        }
        println!(
            "{:<6} {:<10} {:<18} {:<26} {:<26} {}",
            query.ref_id,
            format_duration(range.step),
            kinds.join(","),
            range.start.to_rfc3339(),
            range.end.to_rfc3339(),
            query.expr
        );
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<(Config, Option<PathBuf>)> {
    match path {
        Some(path) => {
            let config = Config::load_with_env(path)
                .with_context(|| format!("loading config from {:?}", path))?;
            Ok((config, Some(path.to_path_buf())))
        }
        None => Config::load_default().context("loading config from a default location"),
    }
}

fn read_input(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("reading {:?}", path))
        }
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("reading stdin")?;
            Ok(text)
        }
    }
}

fn init_logging(config: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("promstep={}", config.level)));

    let registry = tracing_subscriber::registry().with(filter);
    if config.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
