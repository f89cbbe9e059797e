use log::Level::Warn;
use log::{debug, trace};
use serde::Serialize;

use crate::log_or_err;
use crate::process::extract::ExtractSink;
use crate::process::{DEFAULT_BLOCK_SIZE, window_capacity};
use crate::structs::record::{Classified, MpegDecoder, Record, RecordDecoder};
use crate::utils::errors::{SessionError, SyncError};
use crate::utils::window::SlidingBuffer;

/// Locates records in a stream that is fed in arbitrary pieces.
///
/// Every chunk is appended to a fixed window of `capacity` bytes and the window is
/// classified right away. Fully buffered records are removed from the front together with
/// the bytes skipped before them; those skipped bytes are the out-of-band run handed to the
/// [`ExtractSink`]. A record whose tail has not arrived yet stays in place until it has.
///
/// Recovery is local and bounded:
///
/// - a chunk that does not fit the window drops the window and the chunk,
/// - a full window with nothing recognizable in it is dropped,
/// - a record announcing zero length drops the window.
///
/// After any of these the synchronizer is unaligned again and ignores the bytes in front
/// of the next record it finds, exactly as for the very first chunk of a stream, which may
/// start anywhere inside a record.
///
/// # Example
///
/// ```rust
/// use mpstream::process::extract::OobExtractor;
/// use mpstream::process::sync::Synchronizer;
///
/// let mut sync: Synchronizer = Synchronizer::default();
/// let mut extracted = OobExtractor::new(Some(Vec::<u8>::new()));
///
/// // MPEG2.5 Layer III, 8 kbps, 12 kHz: 48-byte frames
/// let mut frame = vec![0xFF, 0xE3, 0x14, 0xC0];
/// frame.resize(48, 0);
///
/// let mut stream = frame.clone();
/// stream.extend_from_slice(b"hidden");
/// stream.extend_from_slice(&frame);
///
/// sync.feed(&stream, &mut extracted)?;
///
/// assert_eq!(sync.stats().frames, 2);
/// assert_eq!(extracted.into_inner().unwrap(), b"hidden");
/// # Ok::<(), mpstream::utils::errors::SessionError>(())
/// ```
#[derive(Debug)]
pub struct Synchronizer<D: RecordDecoder = MpegDecoder> {
    window: SlidingBuffer,
    cursor: usize,
    ignore_first_scan: bool,
    decoder: D,
    stats: SyncStats,
    fail_level: log::Level,
}

/// Counters describing what a synchronizer did with the bytes it was fed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncStats {
    pub frames: u64,
    pub tags: u64,
    /// Runs handed to the extraction sink as hidden data.
    pub oob_runs: u64,
    pub oob_bytes: u64,
    /// Bytes skipped while unaligned.
    pub ignored_bytes: u64,
    /// Windows dropped because nothing usable was found in them.
    pub resyncs: u64,
    /// Chunks that did not fit the window.
    pub overflows: u64,
    /// Buffered and incoming bytes discarded by resyncs and overflows.
    pub dropped_bytes: u64,
}

impl Default for Synchronizer<MpegDecoder> {
    fn default() -> Self {
        Self::for_block_size(DEFAULT_BLOCK_SIZE)
    }
}

impl Synchronizer<MpegDecoder> {
    /// A synchronizer sized for reads of at most `block_size` bytes.
    pub fn for_block_size(block_size: usize) -> Self {
        Self::with_capacity(window_capacity(block_size), MpegDecoder)
    }
}

impl<D: RecordDecoder> Synchronizer<D> {
    pub fn with_capacity(capacity: usize, decoder: D) -> Self {
        Self {
            window: SlidingBuffer::with_capacity(capacity),
            cursor: 0,
            ignore_first_scan: true,
            decoder,
            stats: SyncStats::default(),
            fail_level: log::Level::Error,
        }
    }

    /// Sets the failure level for resynchronization events.
    ///
    /// - `log::Level::Error`: recover silently from desynchronization (default)
    /// - `log::Level::Warn`: abort on the first dropped window (strict mode)
    pub fn set_fail_level(&mut self, level: log::Level) {
        self.fail_level = level;
    }

    pub fn capacity(&self) -> usize {
        self.window.capacity()
    }

    /// Bytes waiting for classification.
    pub fn buffered(&self) -> &[u8] {
        self.window.as_slice()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// `true` until the first record after the start or the last reset is consumed.
    pub fn is_unaligned(&self) -> bool {
        self.ignore_first_scan
    }

    pub fn stats(&self) -> SyncStats {
        self.stats
    }

    /// Adds one network read to the window and consumes every complete record.
    ///
    /// Chunks must be fed in arrival order. A chunk larger than the free space of the window
    /// is not retained, and neither is anything buffered before it.
    pub fn feed<S: ExtractSink>(&mut self, chunk: &[u8], sink: &mut S) -> Result<(), SessionError> {
        if !self.window.try_extend(chunk) {
            let error = SyncError::WindowOverflow {
                length: self.window.len(),
                incoming: chunk.len(),
                capacity: self.window.capacity(),
            };

            self.stats.overflows += 1;
            self.stats.dropped_bytes += (self.window.len() + chunk.len()) as u64;
            self.reset();

            log_or_err!(self, Warn, error);
            return Ok(());
        }

        self.classify(sink)
    }

    fn classify<S: ExtractSink>(&mut self, sink: &mut S) -> Result<(), SessionError> {
        loop {
            if self.window.is_empty() {
                self.cursor = 0;
                return Ok(());
            }

            let buf = self.window.as_slice();
            let classified = self.decoder.classify(buf, self.cursor);
            trace!(
                "classify {} buffered bytes from {}: {classified:?}",
                buf.len(),
                self.cursor
            );

            let (offset, record) = match classified {
                Classified::Record { offset, record } => (offset, record),
                Classified::Truncated { offset } => {
                    self.cursor = offset;
                    return Ok(());
                }
                Classified::Unrecognized if !self.window.is_full() => {
                    // Nothing here can start a header; later bytes decide what these are.
                    self.cursor = buf.len();
                    return Ok(());
                }
                Classified::Unrecognized => {
                    let error = SyncError::Unrecognized {
                        capacity: self.window.capacity(),
                    };
                    self.drop_window();

                    log_or_err!(self, Warn, error);
                    return Ok(());
                }
            };

            let total = record.total_len();
            if total == 0 {
                let error = SyncError::ZeroLengthRecord { offset };
                self.drop_window();

                log_or_err!(self, Warn, error);
                return Ok(());
            }

            let end = offset + total;
            if end > buf.len() {
                self.cursor = offset;
                return Ok(());
            }

            let ignored = self.ignore_first_scan;
            if offset > 0 {
                sink.on_oob_run(&buf[..offset], ignored)
                    .map_err(SessionError::Extract)?;

                if ignored {
                    self.stats.ignored_bytes += offset as u64;
                } else {
                    self.stats.oob_runs += 1;
                    self.stats.oob_bytes += offset as u64;
                }
            }
            sink.on_record(offset, &record);

            match record {
                Record::Frame { .. } => {
                    self.stats.frames += 1;
                    debug!("frame: {total} bytes after {offset} skipped");
                }
                Record::Tag { has_footer, .. } => {
                    self.stats.tags += 1;
                    debug!("tag: {total} bytes (footer: {has_footer}) after {offset} skipped");
                }
            }

            self.window.consume_front(end);
            self.cursor = 0;
            self.ignore_first_scan = false;
        }
    }

    fn drop_window(&mut self) {
        self.stats.resyncs += 1;
        self.stats.dropped_bytes += self.window.len() as u64;
        self.reset();
    }

    fn reset(&mut self) {
        self.window.clear();
        self.cursor = 0;
        self.ignore_first_scan = true;
    }
}
