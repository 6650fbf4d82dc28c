use std::{
    io::{self, Write},
    path::PathBuf,
};

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rate_spreads::{
    cache::{ExpiringCache, FileCacheStore},
    config::AppConfig,
    io::{CsvSink, SeriesSink},
    models::series::{SeriesId, SeriesStore},
    pipeline::SpreadPipeline,
    providers::fred_rest::FredProvider,
    spreads::SpreadEngine,
    yield_curve::YieldCurveAdapter,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(version, about = "Treasury rate spreads from FRED")]
struct Cli {
    /// Path to the config file (TOML); built-in defaults when omitted
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// First day to fetch, e.g. "2020-01-01" (default: five years before --end)
    #[arg(long, global = true)]
    start: Option<NaiveDate>,

    /// Day after the last day to fetch (default: today)
    #[arg(long, global = true)]
    end: Option<NaiveDate>,

    /// Neither read nor write the on-disk cache
    #[arg(long, global = true)]
    no_cache: bool,

    /// Round printed values to this many decimals
    #[arg(long, global = true)]
    precision: Option<usize>,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the spread table as CSV
    Spreads {
        /// Only print this spread, e.g. "DGS10-DGS2"
        #[arg(long)]
        only: Option<String>,
    },

    /// Print the fetched yield curve as CSV
    Curve,

    /// Print the configured catalog and spread recipe
    Catalog,
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn render(store: &SeriesStore, precision: Option<usize>) -> Result<()> {
    let mut sink = CsvSink::new(io::stdout().lock());
    if let Some(digits) = precision {
        sink = sink.with_precision(digits);
    }
    let rows = sink.render(store).context("failed to render table")?;
    sink.into_inner().context("failed to flush output")?;
    info!(rows, series = store.len(), "rendered");
    Ok(())
}

fn write_catalog(cfg: &AppConfig, mut out: impl Write) -> io::Result<()> {
    writeln!(out, "maturity_years,id")?;
    for entry in &cfg.catalog {
        writeln!(out, "{},{}", entry.maturity_years, entry.id)?;
    }
    writeln!(out)?;
    writeln!(out, "spread,minuend,subtrahend")?;
    for pair in cfg.recipe.pairs() {
        writeln!(out, "{},{},{}", pair.output_id(), pair.minuend, pair.subtrahend)?;
    }
    out.flush()
}

fn build_pipeline(cfg: &AppConfig) -> Result<SpreadPipeline<FredProvider, FileCacheStore>> {
    let provider = FredProvider::from_env(cfg.provider.fred_options())
        .context("failed to set up the FRED provider")?;
    Ok(SpreadPipeline::new(
        YieldCurveAdapter::new(provider, cfg.catalog.clone()),
        SpreadEngine::new(cfg.recipe.clone()),
        ExpiringCache::new(FileCacheStore::new(&cfg.cache.dir)),
    )
    .with_ttls(cfg.cache.yield_curve_ttl(), cfg.cache.spreads_ttl()))
}

fn select(store: SeriesStore, only: Option<&str>) -> Result<SeriesStore> {
    let Some(only) = only else {
        return Ok(store);
    };
    let Some(series) = store.get(only) else {
        let available: Vec<_> = store.ids().map(|id| id.as_str()).collect();
        bail!("no spread named '{only}'; available: {}", available.join(", "));
    };
    Ok([(SeriesId::from(only), series.clone())].into_iter().collect())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // A missing .env file is fine; FRED_API_KEY may come from the environment.
    let _ = dotenvy::dotenv();

    let cfg = match &cli.config {
        Some(path) => AppConfig::load_path(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => AppConfig::default(),
    };

    let start = cli.start.or(cfg.fetch.start);
    let end = cli.end.or(cfg.fetch.end);

    let store = match &cli.command {
        Commands::Catalog => {
            write_catalog(&cfg, io::stdout().lock()).context("failed to print catalog")?;
            return Ok(());
        }
        Commands::Curve => {
            let pipeline = build_pipeline(&cfg)?;
            if cli.no_cache {
                pipeline.adapter().fetch(start, end).await?
            } else {
                pipeline.yield_curve(start, end).await?
            }
        }
        Commands::Spreads { only } => {
            let pipeline = build_pipeline(&cfg)?;
            let spreads = if cli.no_cache {
                pipeline.spreads_uncached(start, end).await?
            } else {
                pipeline.spreads(start, end).await?
            };
            select(spreads, only.as_deref())?
        }
    };

    render(&store, cli.precision)
}
