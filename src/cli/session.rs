use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::MultiProgress;
use log::Level;
use serde::Serialize;

use mpstream::process::session::{SessionConfig, SessionStats, StreamSession};
use mpstream::utils::errors::SessionError;

use super::command::{Cli, SinkArgs};
use super::output::{CAPTURE_NAME, EXTRACT_NAME, create_output_file};
use super::progress::{create_spinner, update_spinner};

#[derive(Debug, Serialize)]
struct Summary<'a> {
    source: &'a str,
    block_size: usize,
    capture: Option<&'a Path>,
    extract: Option<&'a Path>,
    stats: SessionStats,
}

fn open_sink(
    enabled: bool,
    dir: &Path,
    label: &str,
    name: (&str, &str),
) -> Result<Option<(PathBuf, BufWriter<File>)>> {
    if !enabled {
        return Ok(None);
    }

    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    let (path, file) = create_output_file(dir, label, name)?;
    Ok(Some((path, BufWriter::new(file))))
}

/// Runs one session over `source` with the sinks selected in `sinks`.
///
/// A failing source ends the session normally; everything received up to that point is
/// kept and reported.
pub fn run_session<R: Read>(
    source: &mut R,
    source_name: &str,
    label: &str,
    sinks: &SinkArgs,
    cli: &Cli,
    multi: Option<&MultiProgress>,
) -> Result<SessionStats> {
    let dir = sinks.output_path.clone().unwrap_or_else(|| PathBuf::from("."));

    let capture = open_sink(sinks.capture, &dir, label, CAPTURE_NAME)?;
    let extract = open_sink(sinks.extract, &dir, label, EXTRACT_NAME)?;
    let capture_path = capture.as_ref().map(|(path, _)| path.clone());
    let extract_path = extract.as_ref().map(|(path, _)| path.clone());

    if let Some(path) = &capture_path {
        log::info!("Capturing stream to {}", path.display());
    }
    if let Some(path) = &extract_path {
        log::info!("Extracting OOB data to {}", path.display());
    }

    let config = SessionConfig {
        block_size: sinks.block_size as usize,
        fail_level: if cli.strict { Level::Warn } else { Level::Error },
    };
    let mut session = StreamSession::new(
        config,
        capture.map(|(_, writer)| writer),
        extract.map(|(_, writer)| writer),
    );

    let pb = multi.map(|multi| create_spinner(multi, source_name)).transpose()?;
    let result = session.run(source, |stats| {
        if let Some(pb) = &pb {
            update_spinner(pb, stats);
        }
    });
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let stats = match result {
        Ok(stats) => stats,
        Err(SessionError::Source(e)) => {
            log::warn!("{source_name} ended with an error: {e}");
            session.stats()
        }
        Err(e) => return Err(e.into()),
    };
    session.finish()?;

    log_summary(source_name, &stats);

    if let Some(path) = &sinks.summary {
        let summary = Summary {
            source: source_name,
            block_size: config.block_size,
            capture: capture_path.as_deref(),
            extract: extract_path.as_deref(),
            stats,
        };
        write_summary(path, &summary)?;
    }

    Ok(stats)
}

fn log_summary(source_name: &str, stats: &SessionStats) {
    let sync = &stats.sync;
    log::info!(
        "{source_name}: {} bytes in {} reads, {} frames, {} tags, {} OOB bytes in {} runs",
        stats.bytes_received,
        stats.chunks,
        sync.frames,
        sync.tags,
        sync.oob_bytes,
        sync.oob_runs
    );

    if sync.resyncs > 0 || sync.overflows > 0 {
        log::info!(
            "Lost sync {} times ({} overflows), {} bytes dropped, {} bytes ignored",
            sync.resyncs + sync.overflows,
            sync.overflows,
            sync.dropped_bytes,
            sync.ignored_bytes
        );
    }
}

fn write_summary(path: &Path, summary: &Summary<'_>) -> Result<()> {
    log::info!("Writing summary: {}", path.display());
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;

    let mut writer = BufWriter::new(file);
    serde_yaml_ng::to_writer(&mut writer, summary)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::command::Commands;
    use clap::Parser as ClapParser;
    use std::ffi::OsStr;
    use std::io::Cursor;

    fn mpeg_frame() -> Vec<u8> {
        let mut frame = vec![0xFF, 0xE3, 0x14, 0xC0];
        frame.resize(48, 0);
        frame
    }

    #[test]
    fn scan_writes_sinks_and_summary() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let summary = dir.path().join("summary.yaml");

        let cli = Cli::try_parse_from([
            OsStr::new("mpstreamd"),
            OsStr::new("scan"),
            OsStr::new("-"),
            OsStr::new("--capture"),
            OsStr::new("--extract"),
            OsStr::new("--output-path"),
            dir.path().as_os_str(),
            OsStr::new("--summary"),
            summary.as_os_str(),
        ])?;
        let Commands::Scan(args) = &cli.command else {
            panic!("expected scan subcommand");
        };

        let mut stream = mpeg_frame();
        stream.extend_from_slice(b"payload");
        stream.extend(mpeg_frame());

        let stats = run_session(
            &mut Cursor::new(stream.clone()),
            "recording.mp3",
            "recording",
            &args.sinks,
            &cli,
            None,
        )?;

        assert_eq!(stats.sync.frames, 2);
        assert_eq!(
            fs::read(dir.path().join("recording-captured-stream.mp3"))?,
            stream
        );
        assert_eq!(
            fs::read(dir.path().join("recording-extracted-oob.dat"))?,
            b"payload"
        );

        let yaml = fs::read_to_string(&summary)?;
        assert!(yaml.contains("source: recording.mp3"));
        assert!(yaml.contains("oob_bytes: 7"));
        Ok(())
    }
}
