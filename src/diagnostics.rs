//! Observational hooks called by the indexing and matching phases.
//!
//! The core reports unconditionally; implementations decide what to keep.

use std::fmt;
use std::time::Duration;

use tracing::{debug, info};

use crate::fingerprint::Digest;
use crate::matcher::MatchSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Indexing,
    Matching,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Indexing => f.write_str("indexing"),
            Phase::Matching => f.write_str("matching"),
        }
    }
}

/// Process memory usage in kibibytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryStats {
    pub resident_kib: u64,
    pub peak_resident_kib: u64,
}

impl MemoryStats {
    /// Current resident set size, `None` where the platform does not expose it.
    pub fn current() -> Option<Self> {
        #[cfg(target_os = "linux")]
        {
            let status = std::fs::read_to_string("/proc/self/status").ok()?;
            Self::parse_proc_status(&status)
        }
        #[cfg(not(target_os = "linux"))]
        {
            None
        }
    }

    #[cfg_attr(not(target_os = "linux"), allow(dead_code))]
    fn parse_proc_status(status: &str) -> Option<Self> {
        let field = |name: &str| {
            status
                .lines()
                .find_map(|line| line.strip_prefix(name))
                .and_then(|rest| {
                    rest.trim().trim_end_matches("kB").trim().parse::<u64>().ok()
                })
        };
        Some(Self {
            resident_kib: field("VmRSS:")?,
            peak_resident_kib: field("VmHWM:")?,
        })
    }
}

pub trait Diagnostics: Send {
    fn phase_started(&mut self, _phase: Phase) {}

    fn phase_finished(&mut self, _phase: Phase, _packets: u64, _elapsed: Duration) {}

    /// A modified-capture packet at `position` (1-based) had no source counterpart.
    fn unmatched(&mut self, _position: u64, _digest: &Digest) {}

    fn memory(&mut self, _stats: MemoryStats) {}

    /// Source capture fully indexed.
    fn indexed(&mut self, _packets_read: u64, _distinct: u64) {}

    /// Output capture fully written.
    fn written(&mut self, _summary: &MatchSummary) {}
}

/// Records nothing.
#[derive(Debug, Default)]
pub struct NullDiagnostics;

impl Diagnostics for NullDiagnostics {}

/// Emits everything as `tracing` events.
#[derive(Debug, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn phase_started(&mut self, phase: Phase) {
        debug!(%phase, "phase started");
    }

    fn phase_finished(&mut self, phase: Phase, packets: u64, elapsed: Duration) {
        debug!(%phase, packets, "time elapsed is {:.6} seconds", elapsed.as_secs_f64());
    }

    fn unmatched(&mut self, position: u64, digest: &Digest) {
        debug!(position, %digest, "no source packet matches, timestamp reset to epoch");
    }

    fn memory(&mut self, stats: MemoryStats) {
        debug!(
            rss_mib = stats.resident_kib / 1024,
            peak_rss_mib = stats.peak_resident_kib / 1024,
            "memory usage"
        );
    }

    fn indexed(&mut self, packets_read: u64, distinct: u64) {
        info!(
            packets = packets_read,
            distinct, "finished reading {} packets into index", packets_read
        );
    }

    fn written(&mut self, summary: &MatchSummary) {
        info!(
            written = summary.written,
            matched = summary.matched,
            unmatched = summary.unmatched,
            "finished writing output"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_proc_status() {
        let status =
            "Name:\tpcap-timeshifter\nVmHWM:\t   20480 kB\nVmRSS:\t   10240 kB\nThreads:\t1\n";
        let stats = MemoryStats::parse_proc_status(status).unwrap();
        assert_eq!(stats.resident_kib, 10240);
        assert_eq!(stats.peak_resident_kib, 20480);
    }

    #[test]
    fn missing_fields_yield_none() {
        assert!(MemoryStats::parse_proc_status("Name:\tx\n").is_none());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn current_reports_on_linux() {
        let stats = MemoryStats::current().unwrap();
        assert!(stats.peak_resident_kib >= stats.resident_kib);
    }
}
