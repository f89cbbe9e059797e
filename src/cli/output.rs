use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

pub const CAPTURE_NAME: (&str, &str) = ("captured-stream", "mp3");
pub const EXTRACT_NAME: (&str, &str) = ("extracted-oob", "dat");

const MAX_SUFFIX: u32 = 10_000;

/// Reduces a host name or file stem to characters that are safe in a file name.
pub fn sanitize_label(label: &str) -> String {
    let label: String = label
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
            _ => '_',
        })
        .collect();

    let trimmed = label.trim_matches('.');
    if trimmed.is_empty() {
        "stream".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Creates `<dir>/<label>-<name>.<ext>`, appending `-1`, `-2`, .. to the name until it
/// does not collide with an existing file.
pub fn create_output_file(
    dir: &Path,
    label: &str,
    (name, ext): (&str, &str),
) -> Result<(PathBuf, File)> {
    for n in 0..MAX_SUFFIX {
        let file_name = match n {
            0 => format!("{label}-{name}.{ext}"),
            n => format!("{label}-{name}-{n}.{ext}"),
        };
        let path = dir.join(file_name);

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to create {}", path.display()));
            }
        }
    }

    bail!("No free file name for {label}-{name}.{ext} in {}", dir.display())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;

    #[test]
    fn labels_are_file_name_safe() {
        assert_eq!(sanitize_label("radio.example.net"), "radio.example.net");
        assert_eq!(sanitize_label("[::1]"), "___1_");
        assert_eq!(sanitize_label("my show/ep 1"), "my_show_ep_1");
        assert_eq!(sanitize_label(".."), "stream");
    }

    #[test]
    fn existing_files_are_never_overwritten() -> Result<()> {
        let dir = tempfile::tempdir()?;

        let (first, mut file) = create_output_file(dir.path(), "host", CAPTURE_NAME)?;
        file.write_all(b"keep")?;
        let (second, _) = create_output_file(dir.path(), "host", CAPTURE_NAME)?;
        let (third, _) = create_output_file(dir.path(), "host", CAPTURE_NAME)?;

        assert_eq!(first, dir.path().join("host-captured-stream.mp3"));
        assert_eq!(second, dir.path().join("host-captured-stream-1.mp3"));
        assert_eq!(third, dir.path().join("host-captured-stream-2.mp3"));
        assert_eq!(fs::read(first)?, b"keep");

        let (extract, _) = create_output_file(dir.path(), "host", EXTRACT_NAME)?;
        assert_eq!(extract, dir.path().join("host-extracted-oob.dat"));
        Ok(())
    }
}
