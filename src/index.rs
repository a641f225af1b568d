//! Digest to timestamp index built from the source capture.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::time::Instant;

use rayon::prelude::*;

use crate::capture::PacketSource;
use crate::diagnostics::{Diagnostics, MemoryStats, Phase};
use crate::error::{Error, Result};
use crate::fingerprint::{fingerprint, Digest};
use crate::packet::{PacketRecord, Timestamp};

/// Packets handed to the worker pool per batch.
const BATCH_SIZE: usize = 4096;

/// Maps packet content to the timestamp it was seen with in the source capture.
///
/// Repeated content keeps only the timestamp read last.
#[derive(Debug, Clone, Default)]
pub struct TimestampIndex {
    entries: HashMap<Digest, Timestamp>,
}

impl TimestampIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `timestamp` for `digest`, returning the timestamp it replaced.
    pub fn insert(&mut self, digest: Digest, timestamp: Timestamp) -> Option<Timestamp> {
        self.entries.insert(digest, timestamp)
    }

    pub fn get(&self, digest: &Digest) -> Option<Timestamp> {
        self.entries.get(digest).copied()
    }

    /// Timestamp for `digest`, or the epoch when the content was never indexed.
    pub fn lookup(&self, digest: &Digest) -> Timestamp {
        self.get(digest).unwrap_or_default()
    }

    /// Number of distinct digests.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Result of one indexing pass.
#[derive(Debug)]
pub struct IndexSummary {
    pub index: TimestampIndex,
    /// Raw number of source packets, duplicates included.
    pub packets_read: u64,
}

impl IndexSummary {
    pub fn distinct(&self) -> u64 {
        self.index.len() as u64
    }
}

/// Read the whole source capture into a [`TimestampIndex`].
///
/// With more than one worker, hashing is spread over a rayon pool while the
/// capture is still read sequentially; the result is the same as with one.
pub fn build_index<S>(
    source: &mut S,
    workers: usize,
    diagnostics: &mut dyn Diagnostics,
) -> Result<IndexSummary>
where
    S: PacketSource + ?Sized,
{
    diagnostics.phase_started(Phase::Indexing);
    let started = Instant::now();

    let summary = if workers <= 1 {
        index_sequential(source)?
    } else {
        index_parallel(source, workers)?
    };

    diagnostics.phase_finished(Phase::Indexing, summary.packets_read, started.elapsed());
    if let Some(stats) = MemoryStats::current() {
        diagnostics.memory(stats);
    }
    diagnostics.indexed(summary.packets_read, summary.distinct());
    Ok(summary)
}

fn index_sequential<S: PacketSource + ?Sized>(source: &mut S) -> Result<IndexSummary> {
    let mut index = TimestampIndex::new();
    let mut packets_read = 0;

    while let Some(record) = source.next_record()? {
        index.insert(fingerprint(&record.data), record.timestamp);
        packets_read += 1;
    }

    Ok(IndexSummary {
        index,
        packets_read,
    })
}

/// Per-worker partial index, each entry tagged with its read sequence number.
type Shard = HashMap<Digest, (Timestamp, u64)>;

fn keep_latest(shard: &mut Shard, digest: Digest, entry: (Timestamp, u64)) {
    match shard.entry(digest) {
        Entry::Occupied(mut slot) => {
            if entry.1 > slot.get().1 {
                slot.insert(entry);
            }
        }
        Entry::Vacant(slot) => {
            slot.insert(entry);
        }
    }
}

fn merge_shards(mut left: Shard, right: Shard) -> Shard {
    for (digest, entry) in right {
        keep_latest(&mut left, digest, entry);
    }
    left
}

fn index_parallel<S: PacketSource + ?Sized>(
    source: &mut S,
    workers: usize,
) -> Result<IndexSummary> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("indexer-{}", i))
        .build()
        .map_err(|e| Error::WorkerPool {
            workers,
            reason: e.to_string(),
        })?;

    let mut index = TimestampIndex::new();
    let mut packets_read: u64 = 0;
    let mut batch: Vec<(u64, PacketRecord)> = Vec::with_capacity(BATCH_SIZE);

    loop {
        let record = source.next_record()?;
        let exhausted = record.is_none();
        if let Some(record) = record {
            batch.push((packets_read, record));
            packets_read += 1;
        }

        if batch.len() == BATCH_SIZE || (exhausted && !batch.is_empty()) {
            let shard = pool.install(|| hash_batch(std::mem::take(&mut batch)));
            // batches arrive in read order, so a later batch always wins
            for (digest, (timestamp, _)) in shard {
                index.insert(digest, timestamp);
            }
        }

        if exhausted {
            break;
        }
    }

    Ok(IndexSummary {
        index,
        packets_read,
    })
}

fn hash_batch(batch: Vec<(u64, PacketRecord)>) -> Shard {
    batch
        .into_par_iter()
        .fold(Shard::new, |mut shard, (seq, record)| {
            keep_latest(&mut shard, fingerprint(&record.data), (record.timestamp, seq));
            shard
        })
        .reduce(Shard::new, merge_shards)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::VecSource;
    use crate::diagnostics::NullDiagnostics;
    use crate::packet::LinkType;

    /// Yields `good` records, then fails like a truncated capture.
    struct BrokenSource {
        inner: VecSource,
        good: u64,
        read: u64,
    }

    impl PacketSource for BrokenSource {
        fn link_type(&self) -> LinkType {
            self.inner.link_type()
        }

        fn next_record(&mut self) -> Result<Option<PacketRecord>> {
            if self.read == self.good {
                return Err(Error::Read {
                    position: self.read + 1,
                    source: pcap::Error::PcapError("truncated dump file".to_string()),
                });
            }
            self.read += 1;
            self.inner.next_record()
        }
    }

    fn broken(good: u64) -> BrokenSource {
        let records = (0..good as i64 + 10).map(|i| record(i, &i.to_be_bytes())).collect();
        BrokenSource {
            inner: source(records),
            good,
            read: 0,
        }
    }

    fn record(secs: i64, data: &[u8]) -> PacketRecord {
        PacketRecord::new(Timestamp::new(secs, 0), data.to_vec())
    }

    fn source(records: Vec<PacketRecord>) -> VecSource {
        VecSource::new(LinkType::ETHERNET, records)
    }

    #[test]
    fn lookup_miss_is_epoch() {
        let index = TimestampIndex::new();
        assert_eq!(index.get(&fingerprint(b"absent")), None);
        assert_eq!(index.lookup(&fingerprint(b"absent")), Timestamp::EPOCH);
    }

    #[test]
    fn insert_overwrites_previous_timestamp() {
        let mut index = TimestampIndex::new();
        let digest = fingerprint(b"a");
        assert_eq!(index.insert(digest, Timestamp::new(1, 0)), None);
        assert_eq!(index.insert(digest, Timestamp::new(3, 0)), Some(Timestamp::new(1, 0)));
        assert_eq!(index.lookup(&digest), Timestamp::new(3, 0));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn duplicate_content_keeps_last_read() {
        let mut src = source(vec![record(1, b"A"), record(2, b"B"), record(3, b"A")]);
        let summary = build_index(&mut src, 1, &mut NullDiagnostics).unwrap();

        assert_eq!(summary.packets_read, 3);
        assert_eq!(summary.distinct(), 2);
        assert_eq!(summary.index.lookup(&fingerprint(b"A")), Timestamp::new(3, 0));
        assert_eq!(summary.index.lookup(&fingerprint(b"B")), Timestamp::new(2, 0));
    }

    #[test]
    fn empty_source_gives_empty_index() {
        let mut src = source(Vec::new());
        let summary = build_index(&mut src, 1, &mut NullDiagnostics).unwrap();
        assert_eq!(summary.packets_read, 0);
        assert!(summary.index.is_empty());
    }

    #[test]
    fn parallel_matches_sequential() {
        // enough packets to span several batches, with repeats across them
        let records: Vec<_> = (0..(BATCH_SIZE as i64 * 3 + 17))
            .map(|i| record(i, &(i % 1000).to_be_bytes()))
            .collect();

        let sequential =
            build_index(&mut source(records.clone()), 1, &mut NullDiagnostics).unwrap();
        let parallel =
            build_index(&mut source(records.clone()), 4, &mut NullDiagnostics).unwrap();

        assert_eq!(parallel.packets_read, sequential.packets_read);
        assert_eq!(parallel.distinct(), 1000);
        for i in 0..1000i64 {
            let digest = fingerprint(&i.to_be_bytes());
            assert_eq!(parallel.index.get(&digest), sequential.index.get(&digest));
        }
        let last = records.len() as i64 - 1;
        assert_eq!(
            parallel.index.lookup(&fingerprint(&(last % 1000).to_be_bytes())),
            Timestamp::new(last, 0)
        );
    }

    #[test]
    fn parallel_keeps_last_read_within_one_batch() {
        let mut src = source(vec![record(1, b"A"), record(2, b"B"), record(3, b"A")]);
        let summary = build_index(&mut src, 3, &mut NullDiagnostics).unwrap();
        assert_eq!(summary.index.lookup(&fingerprint(b"A")), Timestamp::new(3, 0));
    }

    #[derive(Default)]
    struct Indexed(Vec<(u64, u64)>);

    impl Diagnostics for Indexed {
        fn indexed(&mut self, packets_read: u64, distinct: u64) {
            self.0.push((packets_read, distinct));
        }
    }

    #[test]
    fn completed_index_is_reported_to_diagnostics() {
        let mut src = source(vec![record(1, b"A"), record(2, b"B"), record(3, b"A")]);
        let mut seen = Indexed::default();
        build_index(&mut src, 1, &mut seen).unwrap();
        assert_eq!(seen.0, vec![(3, 2)]);

        let mut seen = Indexed::default();
        assert!(build_index(&mut broken(2), 1, &mut seen).is_err());
        assert!(seen.0.is_empty());
    }

    #[test]
    fn read_error_aborts_sequential_build() {
        let mut src = broken(3);
        let err = build_index(&mut src, 1, &mut NullDiagnostics).unwrap_err();
        assert!(matches!(err, Error::Read { position: 4, .. }));
        assert_eq!(src.read, 3);
    }

    #[test]
    fn read_error_aborts_parallel_build() {
        // fails mid-way through the second batch
        let good = BATCH_SIZE as u64 + 5;
        let mut src = broken(good);
        let err = build_index(&mut src, 4, &mut NullDiagnostics).unwrap_err();
        assert!(matches!(err, Error::Read { position, .. } if position == good + 1));
    }
}
