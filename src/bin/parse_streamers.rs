//! Turns the organisers' CSV export into the roster file the server loads.
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use squid_roster::prep;

#[derive(Parser, Debug)]
#[command(about = "Convert the streamers CSV into data/streamers.json")]
struct Args {
    /// CSV export, first line is the header
    #[arg(short, long, default_value = "data/streamers.csv")]
    input: PathBuf,

    /// where the JSON roster is written
    #[arg(short, long, default_value = "data/streamers.json")]
    output: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    let summary = prep::convert(&args.input, &args.output)
        .with_context(|| format!("converting {}", args.input.display()))?;

    tracing::info!("parsed {} streamers, written to {}", summary.total, args.output.display());
    if summary.with_youtube > 0 {
        tracing::info!("{} streamers have YouTube links", summary.with_youtube);
    }
    Ok(())
}
