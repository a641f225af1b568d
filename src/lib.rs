//! Transfer packet capture timestamps onto the same packets in another capture.
//!
//! The source capture is indexed by packet content, then the modified capture
//! is streamed to the output with each packet's timestamp replaced by the one
//! its content had in the source.

pub mod capture;
pub mod cli;
pub mod diagnostics;
pub mod error;
pub mod fingerprint;
pub mod index;
pub mod matcher;
pub mod packet;
pub mod run;

pub use error::{Error, Result};
pub use fingerprint::{fingerprint, Digest};
pub use index::{build_index, IndexSummary, TimestampIndex};
pub use matcher::{match_and_write, MatchSummary};
pub use packet::{LinkType, PacketRecord, Timestamp};
pub use run::{compare_pcaps, FileArgs, RunCounters, RunState, TimeShift};
