//! Owned packet records and their capture metadata.

use std::fmt;

/// Capture timestamp with microsecond resolution.
///
/// The default value is the epoch, which is what unmatched packets end up
/// carrying after a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    pub secs: i64,
    pub micros: u32,
}

impl Timestamp {
    pub const EPOCH: Timestamp = Timestamp { secs: 0, micros: 0 };

    pub fn new(secs: i64, micros: u32) -> Self {
        Self { secs, micros }
    }

    pub fn is_epoch(&self) -> bool {
        *self == Self::EPOCH
    }
}

impl From<libc::timeval> for Timestamp {
    fn from(tv: libc::timeval) -> Self {
        Self {
            secs: tv.tv_sec as i64,
            micros: tv.tv_usec as u32,
        }
    }
}

impl From<Timestamp> for libc::timeval {
    fn from(ts: Timestamp) -> Self {
        libc::timeval {
            tv_sec: ts.secs as libc::time_t,
            tv_usec: ts.micros as libc::suseconds_t,
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:06}", self.secs, self.micros)
    }
}

/// Link layer type of a capture (the DLT_* value).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkType(pub i32);

impl LinkType {
    pub const ETHERNET: LinkType = LinkType(1);
}

impl From<pcap::Linktype> for LinkType {
    fn from(lt: pcap::Linktype) -> Self {
        LinkType(lt.0)
    }
}

impl From<LinkType> for pcap::Linktype {
    fn from(lt: LinkType) -> Self {
        pcap::Linktype(lt.0)
    }
}

/// A single packet read from a capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketRecord {
    pub timestamp: Timestamp,
    /// Captured length (may be less than `len`).
    pub caplen: u32,
    /// Original length on the wire.
    pub len: u32,
    pub data: Vec<u8>,
}

impl PacketRecord {
    /// Record whose captured and original lengths both equal the payload size.
    pub fn new(timestamp: Timestamp, data: Vec<u8>) -> Self {
        let len = data.len() as u32;
        Self {
            timestamp,
            caplen: len,
            len,
            data,
        }
    }

    pub fn from_pcap(packet: &pcap::Packet<'_>) -> Self {
        Self {
            timestamp: packet.header.ts.into(),
            caplen: packet.header.caplen,
            len: packet.header.len,
            data: packet.data.to_vec(),
        }
    }

    pub fn pcap_header(&self) -> pcap::PacketHeader {
        pcap::PacketHeader {
            ts: self.timestamp.into(),
            caplen: self.caplen,
            len: self.len,
        }
    }

    pub fn is_truncated(&self) -> bool {
        self.caplen < self.len
    }

    /// Same record with only the timestamp replaced.
    pub fn with_timestamp(self, timestamp: Timestamp) -> Self {
        Self { timestamp, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timestamp_is_epoch() {
        assert!(Timestamp::default().is_epoch());
        assert_eq!(Timestamp::default().to_string(), "0.000000");
    }

    #[test]
    fn timeval_conversion_keeps_fields() {
        let ts = Timestamp::new(1_600_000_000, 123_456);
        let tv: libc::timeval = ts.into();
        assert_eq!(tv.tv_sec as i64, 1_600_000_000);
        assert_eq!(Timestamp::from(tv), ts);
    }

    #[test]
    fn with_timestamp_only_touches_timestamp() {
        let mut record = PacketRecord::new(Timestamp::new(5, 0), vec![1, 2, 3]);
        record.len = 60;
        let shifted = record.clone().with_timestamp(Timestamp::new(9, 9));

        assert_eq!(shifted.timestamp, Timestamp::new(9, 9));
        assert_eq!(shifted.data, record.data);
        assert_eq!(shifted.caplen, 3);
        assert_eq!(shifted.len, 60);
        assert!(shifted.is_truncated());
    }
}
