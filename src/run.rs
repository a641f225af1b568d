//! One timestamp transfer run: index the source, then rewrite the modified capture.

use std::path::PathBuf;

use crate::capture::{PacketSink, PacketSource, PcapReader, PcapWriter};
use crate::diagnostics::{Diagnostics, TracingDiagnostics};
use crate::error::{Error, Result};
use crate::index::build_index;
use crate::matcher::match_and_write;

/// The three captures taking part in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileArgs {
    pub source: PathBuf,
    pub modified: PathBuf,
    pub output: PathBuf,
}

impl FileArgs {
    pub fn new(
        source: impl Into<PathBuf>,
        modified: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source: source.into(),
            modified: modified.into(),
            output: output.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounters {
    /// Distinct packet contents in the source capture.
    pub packets_indexed: u64,
    /// Packets written to the output, always the modified capture's count.
    pub packets_written: u64,
    pub source_packets_read: u64,
    pub packets_matched: u64,
    pub packets_unmatched: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Indexing,
    Matching,
    Done,
    Failed,
}

/// Single-shot runner.
pub struct TimeShift {
    files: FileArgs,
    workers: usize,
    diagnostics: Box<dyn Diagnostics>,
    state: RunState,
}

impl TimeShift {
    pub fn new(files: FileArgs) -> Self {
        Self {
            files,
            workers: 1,
            diagnostics: Box::new(TracingDiagnostics),
            state: RunState::Idle,
        }
    }

    /// Threads used to index the source capture. Matching stays sequential.
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn diagnostics(mut self, diagnostics: Box<dyn Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Run against the pcap files named in [`FileArgs`].
    ///
    /// A failure leaves any partially written output on disk.
    pub fn run(&mut self) -> Result<RunCounters> {
        self.begin()?;
        let opened = self.open_files();
        let (mut source, mut modified, mut output) = match opened {
            Ok(files) => files,
            Err(e) => {
                self.state = RunState::Failed;
                return Err(e);
            }
        };
        self.phases(&mut source, &mut modified, &mut output)
    }

    /// Run over arbitrary captures instead of files.
    pub fn run_with<S, M, W>(
        &mut self,
        source: &mut S,
        modified: &mut M,
        sink: &mut W,
    ) -> Result<RunCounters>
    where
        S: PacketSource + ?Sized,
        M: PacketSource + ?Sized,
        W: PacketSink + ?Sized,
    {
        self.begin()?;
        self.phases(source, modified, sink)
    }

    fn begin(&mut self) -> Result<()> {
        if self.state != RunState::Idle {
            return Err(Error::AlreadyRun);
        }
        self.state = RunState::Indexing;
        Ok(())
    }

    fn open_files(&self) -> Result<(PcapReader, PcapReader, PcapWriter)> {
        let modified = PcapReader::open(&self.files.modified)?;
        let output = PcapWriter::create(&self.files.output)?;
        let source = PcapReader::open(&self.files.source)?;
        Ok((source, modified, output))
    }

    fn phases<S, M, W>(
        &mut self,
        source: &mut S,
        modified: &mut M,
        sink: &mut W,
    ) -> Result<RunCounters>
    where
        S: PacketSource + ?Sized,
        M: PacketSource + ?Sized,
        W: PacketSink + ?Sized,
    {
        let indexed = match build_index(source, self.workers, &mut *self.diagnostics) {
            Ok(indexed) => indexed,
            Err(e) => {
                self.state = RunState::Failed;
                return Err(e);
            }
        };

        self.state = RunState::Matching;
        let diagnostics = &mut *self.diagnostics;
        let matched = match match_and_write(modified, &indexed.index, sink, diagnostics) {
            Ok(matched) => matched,
            Err(e) => {
                self.state = RunState::Failed;
                return Err(e);
            }
        };

        self.state = RunState::Done;
        Ok(RunCounters {
            packets_indexed: indexed.distinct(),
            packets_written: matched.written,
            source_packets_read: indexed.packets_read,
            packets_matched: matched.matched,
            packets_unmatched: matched.unmatched,
        })
    }
}

/// Transfer timestamps between the captures in `files`, logging through `tracing`.
pub fn compare_pcaps(files: FileArgs, workers: usize) -> Result<RunCounters> {
    TimeShift::new(files).workers(workers).run()
}
