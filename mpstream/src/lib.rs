//! Incremental synchronizer for MPEG audio broadcasts.
//!
//! ## Technical Overview
//!
//! An internet radio stream is an unbounded sequence of self-delimiting records:
//! MPEG audio frames, occasionally interleaved with ID3v2 tags. A network read may start
//! or stop anywhere inside a record, and bytes that belong to no record at all may sit
//! between them. Those out-of-band (OOB) runs can carry a hidden payload.
//!
//! ### Stream Organization
//!
//! **Frames**: 4-byte header (11-bit sync, version, layer, bitrate, sample rate, padding)
//! followed by the encoded audio. An optional 16-bit CRC follows the header.
//! **Tags**: `"ID3"` magic, 10-byte header with a sync-safe size, optional 10-byte footer.
//!
//! ### Window Management
//!
//! Reads are appended to a fixed window of four read blocks. Fully buffered records are
//! removed from the front, bytes skipped before them are handed to the OOB extraction
//! policy, and a window that holds nothing recognizable is discarded.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mpstream::process::session::{SessionConfig, StreamSession};
//! use mpstream::source::resolve;
//!
//! let mut resolved = resolve("http://radio.example.net:8000/listen.pls")?;
//!
//! let capture = std::fs::File::create("captured-stream.mp3")?;
//! let extracted = std::fs::File::create("extracted-oob.dat")?;
//! let mut session = StreamSession::new(SessionConfig::default(), Some(capture), Some(extracted));
//!
//! let stats = session.run(&mut resolved.stream, |_| {})?;
//! println!("{} frames, {} OOB bytes", stats.sync.frames, stats.sync.oob_bytes);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Stream processing.
///
/// 1. **Synchronization** ([`process::sync`]): sliding window, record classification,
///    compaction and resynchronization.
/// 2. **OOB Extraction** ([`process::extract`]): what happens to bytes skipped before a
///    recognized record.
/// 3. **Capture** ([`process::capture`]): verbatim copy of every received byte.
/// 4. **Sessions** ([`process::session`]): the read loop tying a source to the above.
pub mod process;

/// Record formats found in the stream.
///
/// - **Frames** ([`structs::frame`]): MPEG audio frame headers
/// - **Tags** ([`structs::tag`]): ID3v2 tag headers
/// - **Records** ([`structs::record`]): classification results and the decoder seam
pub mod structs;

/// Stream sources.
///
/// Connection setup and single playlist redirect for `http://` broadcasts.
pub mod source;

/// Supporting infrastructure.
///
/// - **Error Handling** ([`utils::errors`]): Error types
/// - **Window** ([`utils::window`]): Fixed-capacity front-compacting buffer
pub mod utils;
