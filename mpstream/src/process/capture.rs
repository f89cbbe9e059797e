use std::io::{self, Write};

/// Copies every received chunk verbatim, before any classification.
///
/// The capture is byte-identical to what the source delivered after resolution, including
/// whatever the synchronizer later drops.
#[derive(Debug)]
pub struct Capture<W: Write> {
    writer: Option<W>,
    bytes_written: u64,
}

impl<W: Write> Capture<W> {
    pub fn new(writer: Option<W>) -> Self {
        Self {
            writer,
            bytes_written: 0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }

    pub fn on_raw_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.write_all(chunk)?;
            self.bytes_written += chunk.len() as u64;
        }
        Ok(())
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

#[test]
fn capture_concatenates_chunks() -> io::Result<()> {
    let mut capture = Capture::new(Some(Vec::<u8>::new()));
    capture.on_raw_chunk(b"ab")?;
    capture.on_raw_chunk(b"")?;
    capture.on_raw_chunk(b"cde")?;

    assert_eq!(capture.bytes_written(), 5);
    assert_eq!(capture.into_inner().unwrap(), b"abcde");

    let mut disabled = Capture::<Vec<u8>>::new(None);
    disabled.on_raw_chunk(b"ab")?;
    assert_eq!(disabled.bytes_written(), 0);
    Ok(())
}
