use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod error;
mod grid;
mod report;
mod runtime;
mod tally;

use report::lang::LanguageTable;
use report::top::DEFAULT_TOP;

/// Count geotagged tweets and their languages per cell of a lat/lng grid.
#[derive(Debug, Parser)]
#[command(name = "gridtally", version)]
struct Cli {
    /// Tweet file: NDJSON or a CouchDB `rows` export with one row per line
    #[arg(long, default_value = "tinyTwitter.json")]
    data: PathBuf,

    /// Grid cells as a GeoJSON FeatureCollection of polygons
    #[arg(long, default_value = "sydGrid.json")]
    grid: PathBuf,

    /// Language names, one `<name> <code>` pair per line
    #[arg(long, default_value = "langCode.json")]
    lang: PathBuf,

    /// Number of chunks to split the tweet file into (default: pool size)
    #[arg(short, long)]
    workers: Option<usize>,

    /// How many languages to list per cell
    #[arg(long, default_value_t = DEFAULT_TOP)]
    top: usize,

    /// Hide the progress bar
    #[arg(short, long)]
    quiet: bool,

    /// Verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose >= 2)
        .with_thread_ids(verbose >= 2)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let threads = runtime::configure_thread_pool();
    let workers = cli.workers.unwrap_or(threads);

    let names = LanguageTable::load(&cli.lang)?;
    let grid = grid::io::load_grid(&cli.grid)?;
    info!(
        rows = grid.rows(),
        cols = grid.cols(),
        languages = names.len(),
        "inputs loaded"
    );
    debug!(lat = ?grid.lat_lines(), lng = ?grid.lng_lines(), "gridlines");
    if names.is_empty() {
        warn!(path = %cli.lang.display(), "no language names loaded; top lists will be empty");
    }

    let summary = tally::run_tally(&cli.data, &grid, workers, !cli.quiet)
        .with_context(|| format!("tally {}", cli.data.display()))?;

    let rows = report::build_rows(&grid, &summary.global, &names, cli.top);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    report::write_report(&mut out, &rows, cli.top)?;
    report::write_summary(&mut out, &summary)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults() {
        let cli = Cli::try_parse_from(["gridtally"]).unwrap();
        assert_eq!(cli.data, PathBuf::from("tinyTwitter.json"));
        assert_eq!(cli.top, 10);
        assert!(cli.workers.is_none());
        assert!(!cli.quiet);
    }

    #[test]
    fn cli_flags() {
        let cli = Cli::try_parse_from([
            "gridtally", "--data", "big.json", "-w", "16", "--top", "5", "-q", "-vv",
        ])
        .unwrap();
        assert_eq!(cli.data, PathBuf::from("big.json"));
        assert_eq!(cli.workers, Some(16));
        assert_eq!(cli.top, 5);
        assert!(cli.quiet);
        assert_eq!(cli.verbose, 2);
    }
}
