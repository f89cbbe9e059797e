/// Raw stream capture.
pub mod capture;
/// Out-of-band run handling.
pub mod extract;
/// Read loop tying a source to the synchronizer and both sinks.
pub mod session;
/// Record synchronization over a sliding window.
pub mod sync;

/// Bytes requested per read from the stream source.
pub const DEFAULT_BLOCK_SIZE: usize = 1024;

/// Window size in blocks. A record must fit in the window to be recognized.
pub const WINDOW_BLOCKS: usize = 4;

/// Largest MPEG audio frame: MPEG-2.5 Layer II, 160 kbps, 8 kHz, padded.
pub const MAX_FRAME_LEN: usize = 2881;

/// Smallest block size whose window still holds any MPEG audio frame.
pub const MIN_BLOCK_SIZE: usize = MAX_FRAME_LEN.div_ceil(WINDOW_BLOCKS);

pub const fn window_capacity(block_size: usize) -> usize {
    block_size * WINDOW_BLOCKS
}
