use anyhow::Result;
use clap::error::ErrorKind;
use clap::Parser;
use std::io;
use std::path::PathBuf;
use std::process;

use quasi_clique_clusterer::config::Config;
use quasi_clique_clusterer::{cluster_file, storage};

#[derive(Parser, Debug)]
#[clap(
    name = "quasi-clique-clusterer",
    about = "Partition a weighted GML graph into greedily grown quasi-cliques"
)]
struct Cli {
    /// Path to input GML file
    input: PathBuf,

    /// Write the JSON report to this file instead of standard output
    #[clap(long, short)]
    output: Option<PathBuf>,

    /// Edge attribute holding the edge weight
    #[clap(long, default_value = "weight")]
    weight_key: String,

    /// Emit the report on a single line
    #[clap(long)]
    compact: bool,

    /// Verbose logging
    #[clap(long, short)]
    verbose: bool,
}

fn parse_args() -> Cli {
    match Cli::try_parse() {
        Ok(args) => args,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => {
            // Usage errors exit with 1 rather than clap's default of 2
            err.print().ok();
            process::exit(1);
        }
    }
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = parse_args();

    // Configure logging; RUST_LOG takes precedence for trace output
    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .parse_default_env()
        .format_timestamp_millis()
        .init();

    let config = Config {
        weight_key: args.weight_key,
        pretty: !args.compact,
        ..Config::default()
    };

    log::info!("Input: {}", args.input.display());

    let report = cluster_file(&args.input, &config)?;

    match &args.output {
        Some(path) => storage::save_report(&report, path, config.pretty)?,
        None => storage::write_report(&report, io::stdout().lock(), config.pretty)?,
    }

    log::info!("Wrote {} clusters", report.clusters.len());

    Ok(())
}
