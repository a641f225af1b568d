use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use pcap_timeshifter::cli::{Args, Command, MatchArgs};
use pcap_timeshifter::compare_pcaps;

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Command::Match(args) => run_match(&args),
    }
}

fn run_match(args: &MatchArgs) -> Result<()> {
    args.validate()
        .context("Please check the arguments and try again")?;
    debug!("found files");
    info!(
        source = %args.source.display(),
        modified = %args.modified.display(),
        output = %args.output.display(),
        "loading files"
    );

    let counters =
        compare_pcaps(args.file_args(), args.workers as usize).context("Error encountered")?;

    info!(
        "Found {} packets and altered {} packets",
        counters.packets_indexed, counters.packets_written
    );
    Ok(())
}
