use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};

/// File or stdin behind a single `Read`.
pub struct InputReader {
    reader: Box<dyn Read>,
    label: String,
}

impl InputReader {
    /// Use "-" for stdin.
    pub fn new<P: AsRef<Path>>(input_path: P) -> Result<Self> {
        let path = input_path.as_ref();

        if path.as_os_str() == "-" {
            return Ok(Self {
                reader: Box::new(io::stdin().lock()),
                label: "stdin".to_string(),
            });
        }

        let file =
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        let label = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "input".to_string());

        Ok(Self {
            reader: Box::new(BufReader::new(file)),
            label,
        })
    }

    /// Name used for output files: the file stem, or "stdin".
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Read for InputReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}
