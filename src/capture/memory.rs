use std::collections::VecDeque;

use super::{PacketSink, PacketSource};
use crate::error::{Error, Result};
use crate::packet::{LinkType, PacketRecord};

/// Capture held in memory.
#[derive(Debug, Clone)]
pub struct VecSource {
    link_type: LinkType,
    records: VecDeque<PacketRecord>,
}

impl VecSource {
    pub fn new(link_type: LinkType, records: Vec<PacketRecord>) -> Self {
        Self {
            link_type,
            records: records.into(),
        }
    }

    /// Records not read yet.
    pub fn remaining(&self) -> usize {
        self.records.len()
    }
}

impl PacketSource for VecSource {
    fn link_type(&self) -> LinkType {
        self.link_type
    }

    fn next_record(&mut self) -> Result<Option<PacketRecord>> {
        Ok(self.records.pop_front())
    }
}

/// Collects everything written to it.
#[derive(Debug, Clone, Default)]
pub struct VecSink {
    pub header: Option<(u32, LinkType)>,
    pub records: Vec<PacketRecord>,
    pub finished: bool,
    /// Position (1-based) of the packet write that fails, if any.
    pub fail_at: Option<u64>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink whose `position`th packet write fails like a full disk.
    pub fn failing_at(position: u64) -> Self {
        Self {
            fail_at: Some(position),
            ..Self::default()
        }
    }
}

impl PacketSink for VecSink {
    fn write_header(&mut self, snaplen: u32, link_type: LinkType) -> Result<()> {
        if self.header.is_some() {
            return Err(Error::HeaderAlreadyWritten);
        }
        self.header = Some((snaplen, link_type));
        Ok(())
    }

    fn write_packet(&mut self, record: &PacketRecord) -> Result<()> {
        if self.header.is_none() {
            return Err(Error::HeaderMissing);
        }
        let position = self.records.len() as u64 + 1;
        if self.fail_at == Some(position) {
            return Err(Error::PacketWrite {
                position,
                reason: "no space left on device".to_string(),
            });
        }
        self.records.push(record.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}
