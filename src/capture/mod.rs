//! Capture reading and writing.
//!
//! The matching core only talks to [`PacketSource`] and [`PacketSink`]; the
//! container format lives behind them.

mod memory;
mod pcap_file;

pub use memory::{VecSink, VecSource};
pub use pcap_file::{PcapReader, PcapWriter};

use crate::error::Result;
use crate::packet::{LinkType, PacketRecord};

/// Snap length declared in every output header.
pub const MAX_SNAPLEN: u32 = 65535;

/// Sequential reader over the records of one capture.
pub trait PacketSource {
    fn link_type(&self) -> LinkType;

    /// Next record in file order, `None` once the capture is exhausted.
    fn next_record(&mut self) -> Result<Option<PacketRecord>>;
}

/// Writer for an output capture.
///
/// `write_header` must be called exactly once, before any packet.
pub trait PacketSink {
    fn write_header(&mut self, snaplen: u32, link_type: LinkType) -> Result<()>;

    fn write_packet(&mut self, record: &PacketRecord) -> Result<()>;

    /// Flush whatever the sink buffers.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}
