use std::io::{self, Read, Write};

use log::{debug, info, warn};
use serde::Serialize;

use crate::process::capture::Capture;
use crate::process::extract::OobExtractor;
use crate::process::sync::{SyncStats, Synchronizer};
use crate::process::{DEFAULT_BLOCK_SIZE, MAX_FRAME_LEN, window_capacity};
use crate::structs::record::{MpegDecoder, RecordDecoder};
use crate::utils::errors::SessionError;

#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// Bytes requested per read. The synchronization window is four blocks.
    pub block_size: usize,
    /// See [`Synchronizer::set_fail_level`].
    pub fail_level: log::Level,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            fail_level: log::Level::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SessionStats {
    pub bytes_received: u64,
    pub chunks: u64,
    pub captured_bytes: u64,
    pub extracted_bytes: u64,
    pub sync: SyncStats,
}

/// One stream consumer: every chunk goes to the capture first, then to the synchronizer,
/// which reports OOB runs to the extractor.
pub struct StreamSession<C: Write, E: Write, D: RecordDecoder = MpegDecoder> {
    sync: Synchronizer<D>,
    capture: Capture<C>,
    extractor: OobExtractor<E>,
    block_size: usize,
    bytes_received: u64,
    chunks: u64,
}

impl<C: Write, E: Write> StreamSession<C, E> {
    pub fn new(config: SessionConfig, capture: Option<C>, extract: Option<E>) -> Self {
        if window_capacity(config.block_size) < MAX_FRAME_LEN {
            warn!(
                "{}-byte window is smaller than the largest MPEG frame ({MAX_FRAME_LEN} bytes)",
                window_capacity(config.block_size)
            );
        }
        Self::with_decoder(config, capture, extract, MpegDecoder)
    }
}

impl<C: Write, E: Write, D: RecordDecoder> StreamSession<C, E, D> {
    pub fn with_decoder(
        config: SessionConfig,
        capture: Option<C>,
        extract: Option<E>,
        decoder: D,
    ) -> Self {
        let block_size = config.block_size.max(1);
        let mut sync = Synchronizer::with_capacity(window_capacity(block_size), decoder);
        sync.set_fail_level(config.fail_level);

        Self {
            sync,
            capture: Capture::new(capture),
            extractor: OobExtractor::new(extract),
            block_size,
            bytes_received: 0,
            chunks: 0,
        }
    }

    pub fn synchronizer(&self) -> &Synchronizer<D> {
        &self.sync
    }

    /// Handles one received chunk. Chunks longer than a block are accepted as long as they
    /// fit the window.
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Result<(), SessionError> {
        self.bytes_received += chunk.len() as u64;
        self.chunks += 1;

        self.capture
            .on_raw_chunk(chunk)
            .map_err(SessionError::Capture)?;
        self.sync.feed(chunk, &mut self.extractor)
    }

    /// Reads `source` block by block until it is exhausted or fails.
    ///
    /// `on_chunk` is called after each processed chunk. Both sinks are flushed before
    /// returning, also when the source fails.
    pub fn run<R: Read>(
        &mut self,
        source: &mut R,
        mut on_chunk: impl FnMut(&SessionStats),
    ) -> Result<SessionStats, SessionError> {
        info!(
            "Reading in {}-byte blocks, window {} bytes (capture: {}, extract: {})",
            self.block_size,
            self.sync.capacity(),
            self.capture.is_enabled(),
            self.extractor.is_enabled()
        );

        let mut buf = vec![0u8; self.block_size];
        let result = loop {
            let n = match source.read(&mut buf) {
                Ok(0) => {
                    debug!("source exhausted after {} bytes", self.bytes_received);
                    break Ok(());
                }
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => break Err(SessionError::Source(e)),
            };

            if let Err(e) = self.push_chunk(&buf[..n]) {
                break Err(e);
            }
            on_chunk(&self.stats());
        };

        let flushed = self.flush();
        result?;
        flushed?;

        Ok(self.stats())
    }

    pub fn flush(&mut self) -> Result<(), SessionError> {
        self.capture.flush().map_err(SessionError::Capture)?;
        self.extractor.flush().map_err(SessionError::Extract)
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            bytes_received: self.bytes_received,
            chunks: self.chunks,
            captured_bytes: self.capture.bytes_written(),
            extracted_bytes: self.extractor.bytes_written(),
            sync: self.sync.stats(),
        }
    }

    /// Flushes both sinks and hands them back.
    pub fn finish(mut self) -> Result<(Option<C>, Option<E>), SessionError> {
        self.flush()?;
        Ok((self.capture.into_inner(), self.extractor.into_inner()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn mpeg_frame() -> Vec<u8> {
        let mut frame = vec![0xFF, 0xE3, 0x14, 0xC0];
        frame.resize(48, 0x55);
        frame
    }

    fn broadcast() -> Vec<u8> {
        let mut stream = mpeg_frame()[30..].to_vec();
        stream.extend(mpeg_frame());
        stream.extend_from_slice(b"first");
        stream.extend(mpeg_frame());
        stream.extend(mpeg_frame());
        stream.extend_from_slice(b"second");
        stream.extend(mpeg_frame());
        stream
    }

    /// Delivers at most `step` bytes per read and is interrupted once.
    struct Trickle {
        data: Cursor<Vec<u8>>,
        step: usize,
        interrupted: bool,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(io::ErrorKind::Interrupted.into());
            }
            let len = buf.len().min(self.step);
            self.data.read(&mut buf[..len])
        }
    }

    /// Fails after delivering its data.
    struct Dropped(Cursor<Vec<u8>>);

    impl Read for Dropped {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.0.read(buf)? {
                0 => Err(io::ErrorKind::ConnectionReset.into()),
                n => Ok(n),
            }
        }
    }

    #[test]
    fn capture_and_extract_in_one_pass() -> anyhow::Result<()> {
        let stream = broadcast();
        let mut source = Trickle {
            data: Cursor::new(stream.clone()),
            step: 37,
            interrupted: false,
        };

        let config = SessionConfig {
            block_size: 64,
            ..Default::default()
        };
        let mut session =
            StreamSession::new(config, Some(Vec::<u8>::new()), Some(Vec::<u8>::new()));

        let mut calls = 0;
        let stats = session.run(&mut source, |_| calls += 1)?;

        assert_eq!(stats.bytes_received, stream.len() as u64);
        assert_eq!(stats.chunks, calls);
        assert_eq!(stats.captured_bytes, stream.len() as u64);
        assert_eq!(stats.extracted_bytes, 11);
        assert_eq!(stats.sync.frames, 4);
        assert_eq!(stats.sync.ignored_bytes, 18);
        assert_eq!(stats.sync.oob_runs, 2);

        let (captured, extracted) = session.finish()?;
        assert_eq!(captured.unwrap(), stream);
        assert_eq!(extracted.unwrap(), b"firstsecond");
        Ok(())
    }

    #[test]
    fn capture_does_not_depend_on_extraction() -> anyhow::Result<()> {
        let stream = broadcast();
        let config = SessionConfig {
            block_size: 64,
            ..Default::default()
        };

        let mut session = StreamSession::new(config, Some(Vec::<u8>::new()), None::<Vec<u8>>);
        session.run(&mut Cursor::new(stream.clone()), |_| {})?;
        let (captured, extracted) = session.finish()?;

        assert_eq!(captured.unwrap(), stream);
        assert!(extracted.is_none());
        Ok(())
    }

    #[test]
    fn garbage_is_captured_but_never_extracted() -> anyhow::Result<()> {
        let stream = vec![0x10u8; 10_000];
        let config = SessionConfig {
            block_size: 100,
            ..Default::default()
        };

        let mut session =
            StreamSession::new(config, Some(Vec::<u8>::new()), Some(Vec::<u8>::new()));
        let stats = session.run(&mut Cursor::new(stream.clone()), |_| {})?;

        assert_eq!(stats.sync.frames, 0);
        assert_eq!(stats.sync.resyncs, 25);
        assert!(session.synchronizer().buffered().len() <= 400);

        let (captured, extracted) = session.finish()?;
        assert_eq!(captured.unwrap(), stream);
        assert!(extracted.unwrap().is_empty());
        Ok(())
    }

    #[test]
    fn smallest_accepted_block_size_keeps_common_frames() -> anyhow::Result<()> {
        use crate::process::MIN_BLOCK_SIZE;

        // MPEG1 Layer3, 128kbps, 44.1kHz: 417 bytes
        let mut frame = vec![0xFF, 0xFB, 0x90, 0x00];
        frame.resize(417, 0);

        let mut stream = Vec::new();
        for _ in 0..50 {
            stream.extend_from_slice(&frame);
            stream.extend_from_slice(b"hid");
        }

        let config = SessionConfig {
            block_size: MIN_BLOCK_SIZE,
            ..Default::default()
        };
        let mut session = StreamSession::new(config, None::<Vec<u8>>, Some(Vec::<u8>::new()));
        let stats = session.run(&mut Cursor::new(stream), |_| {})?;

        assert_eq!(stats.sync.frames, 50);
        assert_eq!(stats.sync.resyncs + stats.sync.overflows, 0);
        // The run after the last frame has no record behind it yet
        assert_eq!(stats.sync.oob_bytes, 49 * 3);
        Ok(())
    }

    #[test]
    fn source_failure_keeps_sinks_flushed() {
        let stream = broadcast();
        let config = SessionConfig {
            block_size: 64,
            ..Default::default()
        };

        let mut session =
            StreamSession::new(config, Some(Vec::<u8>::new()), Some(Vec::<u8>::new()));
        let result = session.run(&mut Dropped(Cursor::new(stream.clone())), |_| {});
        assert!(matches!(result, Err(SessionError::Source(_))));

        assert_eq!(session.stats().bytes_received, stream.len() as u64);
        let (captured, extracted) = session.finish().unwrap();
        assert_eq!(captured.unwrap(), stream);
        assert_eq!(extracted.unwrap(), b"firstsecond");
    }
}
