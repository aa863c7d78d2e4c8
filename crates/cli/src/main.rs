use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tg_cache::CacheStore;

mod commands;

#[derive(Parser)]
#[command(name = "tg")]
#[command(about = "Contract model ingestion with marker-validated caching", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(long, global = true)]
    quiet: bool,

    /// Cache directory (default: <user cache dir>/tg/astg)
    #[arg(long, global = true, env = "TG_CACHE_DIR")]
    cache_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print identity, branch, marker and cache state of each root as JSON
    Status(StatusArgs),

    /// Ingest a project model through the cache and print the response bag
    Ingest(IngestArgs),

    /// Validate a project model file
    Validate(ValidateArgs),
}

#[derive(Args)]
pub struct StatusArgs {
    /// Project roots
    #[arg(default_value = ".")]
    pub roots: Vec<PathBuf>,
}

#[derive(Args)]
pub struct IngestArgs {
    /// Project root
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Project model (JSON) standing in for the source parser; relative to the root
    #[arg(long)]
    pub model: PathBuf,

    /// Directory of contract sources
    #[arg(long, default_value = tg_ingest::DEFAULT_CONTRACTS_DIR)]
    pub contracts_dir: String,

    /// Contracts to keep: `A,B` includes, `!C` excludes
    #[arg(long, default_value = "")]
    pub contracts: String,

    /// Skip the cache lookup (the result is still cached)
    #[arg(long)]
    pub no_cache: bool,

    /// Output path for downstream emitters
    #[arg(long, default_value = "")]
    pub out: String,

    /// `debug` also dumps the project under <root>/.tg/
    #[arg(long, default_value = "")]
    pub log_level: String,

    /// Extra request values (`key=value`), applied after the flags
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub values: Vec<String>,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Project model (JSON)
    pub model: PathBuf,
}

fn init_logging(cli: &Cli) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let cache = cli
        .cache_dir
        .clone()
        .map_or_else(CacheStore::at_default_location, CacheStore::new);
    log::debug!("Cache base: {}", cache.base().display());

    let output = match cli.command {
        Commands::Status(args) => commands::status(args, cache).await?,
        Commands::Ingest(args) => {
            tokio::task::spawn_blocking(move || commands::ingest(&args, cache))
                .await
                .context("Ingest task failed")??
        }
        Commands::Validate(args) => commands::validate(&args)?,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
