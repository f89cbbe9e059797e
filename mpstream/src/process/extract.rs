use std::io::{self, Write};

use log::trace;

use crate::structs::record::Record;

/// Receives the synchronizer's verdict on the bytes it consumes.
pub trait ExtractSink {
    /// Bytes skipped right before a recognized record, in stream order.
    ///
    /// `ignored` is set while the synchronizer is unaligned, that is before the first record
    /// following the start of the stream or a reset. Such bytes are usually the tail of a
    /// record whose start was never seen and must not be treated as hidden data.
    fn on_oob_run(&mut self, run: &[u8], ignored: bool) -> io::Result<()>;

    /// Called once per consumed record, after the run preceding it.
    fn on_record(&mut self, _offset: usize, _record: &Record) {}
}

/// Appends every eligible OOB run to a writer, back to back with no framing.
///
/// Without a writer the extractor accepts and discards everything.
#[derive(Debug)]
pub struct OobExtractor<W: Write> {
    writer: Option<W>,
    bytes_written: u64,
}

impl<W: Write> OobExtractor<W> {
    pub fn new(writer: Option<W>) -> Self {
        Self {
            writer,
            bytes_written: 0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn flush(&mut self) -> io::Result<()> {
        match self.writer.as_mut() {
            Some(writer) => writer.flush(),
            None => Ok(()),
        }
    }

    pub fn into_inner(self) -> Option<W> {
        self.writer
    }
}

impl<W: Write> ExtractSink for OobExtractor<W> {
    fn on_oob_run(&mut self, run: &[u8], ignored: bool) -> io::Result<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };

        if ignored {
            trace!("dropping {} bytes in front of the first record", run.len());
            return Ok(());
        }

        writer.write_all(run)?;
        self.bytes_written += run.len() as u64;
        Ok(())
    }
}
