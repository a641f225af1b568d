//! Streams the modified capture to the output with source timestamps.

use std::time::Instant;

use crate::capture::{PacketSink, PacketSource, MAX_SNAPLEN};
use crate::diagnostics::{Diagnostics, Phase};
use crate::error::Result;
use crate::fingerprint::fingerprint;
use crate::index::TimestampIndex;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchSummary {
    pub written: u64,
    pub matched: u64,
    pub unmatched: u64,
}

/// Copy every packet of `source` to `sink` in order, replacing its timestamp
/// with the one indexed for the same content.
///
/// Packets whose content was never indexed are written with the epoch
/// timestamp. Nothing is dropped or added.
pub fn match_and_write<S, W>(
    source: &mut S,
    index: &TimestampIndex,
    sink: &mut W,
    diagnostics: &mut dyn Diagnostics,
) -> Result<MatchSummary>
where
    S: PacketSource + ?Sized,
    W: PacketSink + ?Sized,
{
    diagnostics.phase_started(Phase::Matching);
    let started = Instant::now();

    sink.write_header(MAX_SNAPLEN, source.link_type())?;

    let mut summary = MatchSummary::default();
    while let Some(record) = source.next_record()? {
        let digest = fingerprint(&record.data);
        let position = summary.written + 1;

        let found = index.get(&digest);
        match found {
            Some(_) => summary.matched += 1,
            None => {
                summary.unmatched += 1;
                diagnostics.unmatched(position, &digest);
            }
        }

        let record = record.with_timestamp(found.unwrap_or_default());
        sink.write_packet(&record)?;
        summary.written += 1;
    }
    sink.finish()?;

    diagnostics.written(&summary);
    diagnostics.phase_finished(Phase::Matching, summary.written, started.elapsed());
    Ok(summary)
}
