use std::fs::File;
use std::path::{Path, PathBuf};

use pcap::{Capture, Offline, Packet, Savefile};
use tracing::debug;

use super::{PacketSink, PacketSource, MAX_SNAPLEN};
use crate::error::{Error, Result};
use crate::packet::{LinkType, PacketRecord};

/// Records written between flushes. `Savefile::write` cannot fail, so write
/// errors only show up when the buffered records are flushed.
const FLUSH_INTERVAL: u64 = 64;

/// Offline libpcap capture read in file order.
pub struct PcapReader {
    cap: Capture<Offline>,
    link_type: LinkType,
    position: u64,
}

impl PcapReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let cap = Capture::from_file(path).map_err(|source| Error::InputOpen {
            path: path.to_path_buf(),
            source,
        })?;
        let link_type = cap.get_datalink().into();
        debug!(path = %path.display(), ?link_type, "opened capture");

        Ok(Self {
            cap,
            link_type,
            position: 0,
        })
    }
}

impl PacketSource for PcapReader {
    fn link_type(&self) -> LinkType {
        self.link_type
    }

    fn next_record(&mut self) -> Result<Option<PacketRecord>> {
        match self.cap.next_packet() {
            Ok(packet) => {
                self.position += 1;
                Ok(Some(PacketRecord::from_pcap(&packet)))
            }
            Err(pcap::Error::NoMorePackets) => Ok(None),
            Err(source) => Err(Error::Read {
                position: self.position + 1,
                source,
            }),
        }
    }
}

/// Output capture written through a libpcap savefile.
///
/// The file is created up front; the pcap header follows once the link type
/// of the modified capture is known.
pub struct PcapWriter {
    path: PathBuf,
    savefile: Option<Savefile>,
    written: u64,
}

impl PcapWriter {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        File::create(&path).map_err(|source| Error::OutputCreate {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), "created output file");

        Ok(Self {
            path,
            savefile: None,
            written: 0,
        })
    }
}

impl PacketSink for PcapWriter {
    fn write_header(&mut self, snaplen: u32, link_type: LinkType) -> Result<()> {
        if self.savefile.is_some() {
            return Err(Error::HeaderAlreadyWritten);
        }
        // pcap_open_dead always declares the maximum snap length
        if snaplen != MAX_SNAPLEN {
            return Err(Error::UnsupportedSnaplen(snaplen));
        }

        let savefile = Capture::dead(link_type.into())
            .and_then(|dead| dead.savefile(&self.path))
            .map_err(|source| Error::HeaderWrite {
                path: self.path.clone(),
                source,
            })?;
        self.savefile = Some(savefile);
        debug!(
            path = %self.path.display(),
            ?link_type,
            snaplen,
            "written header to output file"
        );
        Ok(())
    }

    fn write_packet(&mut self, record: &PacketRecord) -> Result<()> {
        let savefile = self.savefile.as_mut().ok_or(Error::HeaderMissing)?;
        let header = record.pcap_header();
        savefile.write(&Packet::new(&header, &record.data));
        self.written += 1;

        if self.written % FLUSH_INTERVAL == 0 {
            let position = self.written;
            savefile.flush().map_err(|e| Error::PacketWrite {
                position,
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if let Some(savefile) = self.savefile.as_mut() {
            let position = self.written;
            savefile.flush().map_err(|e| Error::PacketWrite {
                position,
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }
}
