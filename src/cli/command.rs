use std::path::PathBuf;

use clap::{Args, Parser as ClapParser, Subcommand, ValueEnum};

use mpstream::process::{DEFAULT_BLOCK_SIZE, MIN_BLOCK_SIZE};

#[derive(Debug, ClapParser)]
#[command(
    name         = env!("CARGO_PKG_NAME"),
    version      = env!("CARGO_PKG_VERSION"),
    long_version = concat!(
        env!("CARGO_PKG_VERSION"),
        " (mpstream ", env!("MPSTREAM_VERSION"),
        ", built ", env!("BUILD_TIMESTAMP"), ")"
    ),
    author       = env!("CARGO_PKG_AUTHORS"),
    about        = "Capture MPEG audio broadcasts and extract data hidden between frames",
    long_about   = None,
)]
pub struct Cli {
    /// Set the log level
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub loglevel: LogLevel,

    /// Abort on the first resynchronization instead of recovering.
    #[arg(long, global = true)]
    pub strict: bool,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Show a progress spinner while reading.
    #[arg(long, global = true)]
    pub progress: bool,

    /// Choose an operation to perform.
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Follow a station playlist and process the live stream.
    Stream(StreamArgs),

    /// Process a recorded stream from a file.
    Scan(ScanArgs),
}

#[derive(Debug, Args)]
pub struct StreamArgs {
    /// Playlist URL of the station (http only).
    #[arg(value_name = "URL")]
    pub url: String,

    #[command(flatten)]
    pub sinks: SinkArgs,
}

#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Recorded stream (use "-" for stdin).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    #[command(flatten)]
    pub sinks: SinkArgs,
}

#[derive(Debug, Args)]
pub struct SinkArgs {
    /// Write every received byte to <HOST>-captured-stream.mp3.
    #[arg(long)]
    pub capture: bool,

    /// Write out-of-band data to <HOST>-extracted-oob.dat.
    #[arg(long)]
    pub extract: bool,

    /// Directory for capture and extraction files.
    #[arg(long, value_name = "PATH")]
    pub output_path: Option<PathBuf>,

    /// Bytes per read; the synchronization window is four blocks and must hold the largest
    /// MPEG frame.
    #[arg(
        long,
        value_name = "BYTES",
        default_value_t = DEFAULT_BLOCK_SIZE as u32,
        value_parser = clap::value_parser!(u32).range(MIN_BLOCK_SIZE as i64..=1 << 20),
    )]
    pub block_size: u32,

    /// Write session statistics as YAML.
    #[arg(long, value_name = "FILE")]
    pub summary: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    /// Disable logging output.
    Off,
    /// No output except errors.
    Error,
    /// Show warnings and errors.
    Warn,
    /// Show info, warnings and errors (default).
    Info,
    /// Show debug, info, warnings and errors.
    Debug,
    /// Show all log messages including trace.
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Colorized human-readable text.
    Plain,
    /// Structured JSON per log record.
    Json,
}
