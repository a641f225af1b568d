//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

use crate::error::{Error, Result};
use crate::run::FileArgs;

/// Move packet capture timestamps between captures of the same traffic.
#[derive(Parser, Debug)]
#[command(name = "pcap-timeshifter")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Match the timestamps of a source capture to a given output capture
    ///
    /// Processes the timestamps from a given pcap file and attaches them to
    /// the same packets from another capture file. Useful for analysing
    /// thresholding etc. after processing or recapturing packets in some
    /// other way.
    Match(MatchArgs),
}

#[derive(ClapArgs, Debug)]
pub struct MatchArgs {
    /// Capture carrying the original timestamps
    #[arg(value_name = "ORIGINAL")]
    pub source: PathBuf,

    /// Capture whose packets are written out
    #[arg(value_name = "MODIFIED")]
    pub modified: PathBuf,

    /// Capture to create
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// Overwrite the output file if it exists
    #[arg(short, long)]
    pub force: bool,

    /// Threads used to index the original capture
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
    pub workers: u16,
}

impl MatchArgs {
    /// Both inputs must exist; the output must not unless `--force` is given.
    pub fn validate(&self) -> Result<()> {
        for input in [&self.source, &self.modified] {
            if !input.exists() {
                return Err(Error::InputMissing(input.clone()));
            }
        }
        if self.output.exists() && !self.force {
            return Err(Error::OutputExists(self.output.clone()));
        }
        Ok(())
    }

    pub fn file_args(&self) -> FileArgs {
        FileArgs::new(&self.source, &self.modified, &self.output)
    }
}
