//! Error types for pcap-timeshifter.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;

/// Every failure aborts the run; nothing is recovered locally.
#[derive(Error, Debug)]
pub enum Error {
    /// Source or modified capture could not be opened or parsed
    #[error("cannot open capture {path}: {source}")]
    InputOpen {
        path: PathBuf,
        #[source]
        source: pcap::Error,
    },

    /// A capture failed while being read
    #[error("failed reading packet {position}: {source}")]
    Read {
        position: u64,
        #[source]
        source: pcap::Error,
    },

    /// Output capture could not be created
    #[error("cannot create output {path}: {source}")]
    OutputCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Output global header could not be written
    #[error("cannot write capture header to {path}: {source}")]
    HeaderWrite {
        path: PathBuf,
        #[source]
        source: pcap::Error,
    },

    /// A packet record could not be written
    #[error("cannot write packet {position}: {reason}")]
    PacketWrite { position: u64, reason: String },

    #[error("packet written before the capture header")]
    HeaderMissing,

    #[error("capture header already written")]
    HeaderAlreadyWritten,

    #[error("unsupported snap length {0}, only 65535 can be written")]
    UnsupportedSnaplen(u32),

    /// The indexing worker pool could not be started
    #[error("cannot start {workers} indexing workers: {reason}")]
    WorkerPool { workers: usize, reason: String },

    #[error("run already executed")]
    AlreadyRun,

    #[error("input file not found: {0}")]
    InputMissing(PathBuf),

    #[error("output file {0} exists already, use -f to force overwriting")]
    OutputExists(PathBuf),
}
