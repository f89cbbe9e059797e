use std::io;

#[macro_export]
macro_rules! log_or_err {
    ($state:expr, $level:expr, $err:expr $(,)?) => {{
        if $level <= $state.fail_level {
            return Err($err.into());
        } else {
            match $level {
                ::log::Level::Error => ::log::error!("{}", $err),
                ::log::Level::Warn => ::log::warn!("{}", $err),
                ::log::Level::Info => ::log::info!("{}", $err),
                ::log::Level::Debug => ::log::debug!("{}", $err),
                ::log::Level::Trace => ::log::trace!("{}", $err),
            }
        }
    }};
}

#[derive(thiserror::Error, Debug)]
pub enum SyncError {
    #[error("No record recognized in a full {capacity}-byte window, resynchronizing")]
    Unrecognized { capacity: usize },

    #[error("Zero-length record at offset {offset}, resynchronizing")]
    ZeroLengthRecord { offset: usize },

    #[error(
        "Chunk of {incoming} bytes does not fit the window ({length}/{capacity} used), dropping buffered data"
    )]
    WindowOverflow {
        length: usize,
        incoming: usize,
        capacity: usize,
    },
}

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("Stream source failed: {0}")]
    Source(#[source] io::Error),

    #[error("Failed to write captured stream: {0}")]
    Capture(#[source] io::Error),

    #[error("Failed to write extracted OOB data: {0}")]
    Extract(#[source] io::Error),

    #[error(transparent)]
    Sync(#[from] SyncError),
}

#[derive(thiserror::Error, Debug)]
pub enum ResolveError {
    #[error("Invalid stream URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Unsupported URL scheme {0:?}, only http is supported")]
    UnsupportedScheme(String),

    #[error("Stream URL {0:?} has no host")]
    MissingHost(String),

    #[error("Failed to connect to {host}:{port}: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    #[error("Request to {host} failed: {source}")]
    Request {
        host: String,
        #[source]
        source: io::Error,
    },

    #[error("Playlist response from {host} exceeds {limit} bytes")]
    PlaylistTooLarge { host: String, limit: usize },

    #[error("No http:// redirect found in the response from {0}")]
    NoRedirect(String),
}
