//! MPEG audio frame headers.
//!
//! Frame header structure (4 bytes):
//! AAAAAAAA AAABBCCD EEEEFFGH IIJJKLMM
//!
//! A = sync (11 bits)
//! B = MPEG version (2 bits): 00=2.5, 01=reserved, 10=2, 11=1
//! C = Layer (2 bits): 00=reserved, 01=III, 10=II, 11=I
//! D = Protection bit (0 = 16-bit CRC follows the header)
//! E = Bitrate index (4 bits)
//! F = Sample rate index (2 bits)
//! G = Padding bit
//! H = Private bit
//! I = Channel mode (2 bits)
//! J = Mode extension (2 bits)
//! K = Copyright
//! L = Original
//! M = Emphasis (2 bits)

use std::io;

use bitstream_io::{BigEndian, BitRead, BitReader};
use memchr::memchr_iter;

use crate::structs::record::Probe;

pub const FRAME_HEADER_LEN: usize = 4;
pub const FRAME_CRC_LEN: usize = 2;

const FRAME_SYNC: u16 = 0x7FF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MpegVersion {
    Mpeg1,
    Mpeg2,
    Mpeg25,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Layer1,
    Layer2,
    Layer3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelMode {
    Stereo,
    JointStereo,
    DualChannel,
    Mono,
}

// Bitrate lookup tables (kbps), index 0 = free format, 15 = bad
const BITRATES_V1_L1: [u32; 16] = [0, 32, 64, 96, 128, 160, 192, 224, 256, 288, 320, 352, 384, 416, 448, 0];
const BITRATES_V1_L2: [u32; 16] = [0, 32, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384, 0];
const BITRATES_V1_L3: [u32; 16] = [0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 0];
const BITRATES_V2_L1: [u32; 16] = [0, 32, 48, 56, 64, 80, 96, 112, 128, 144, 160, 176, 192, 224, 256, 0];
const BITRATES_V2_L23: [u32; 16] = [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160, 0];

// Sample rate lookup tables (Hz), index 3 is reserved
const SAMPLE_RATES_V1: [u32; 4] = [44100, 48000, 32000, 0];
const SAMPLE_RATES_V2: [u32; 4] = [22050, 24000, 16000, 0];
const SAMPLE_RATES_V25: [u32; 4] = [11025, 12000, 8000, 0];

/// Header fields as they appear on the wire.
#[derive(Debug)]
struct RawHeader {
    sync: u16,
    version: u8,
    layer: u8,
    protection_absent: bool,
    bitrate_index: u8,
    sample_rate_index: u8,
    padding: bool,
    _private: bool,
    channel_mode: u8,
    _mode_extension: u8,
    _copyright: bool,
    _original: bool,
    emphasis: u8,
}

impl RawHeader {
    fn read(header: &[u8]) -> io::Result<Self> {
        let mut bs = BitReader::endian(header, BigEndian);

        Ok(Self {
            sync: bs.read_unsigned_var(11)?,
            version: bs.read_unsigned_var(2)?,
            layer: bs.read_unsigned_var(2)?,
            protection_absent: bs.read_bit()?,
            bitrate_index: bs.read_unsigned_var(4)?,
            sample_rate_index: bs.read_unsigned_var(2)?,
            padding: bs.read_bit()?,
            _private: bs.read_bit()?,
            channel_mode: bs.read_unsigned_var(2)?,
            _mode_extension: bs.read_unsigned_var(2)?,
            _copyright: bs.read_bit()?,
            _original: bs.read_bit()?,
            emphasis: bs.read_unsigned_var(2)?,
        })
    }
}

/// A decoded MPEG audio frame header.
///
/// `frame_size` covers the whole frame: header, optional CRC and audio data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub version: MpegVersion,
    pub layer: Layer,
    pub protected: bool,
    pub bitrate: u32,
    pub sample_rate: u32,
    pub padding: bool,
    pub channel_mode: ChannelMode,
    pub header_size: usize,
    pub frame_size: usize,
}

impl FrameHeader {
    /// Parse the first four bytes of `header`.
    ///
    /// Returns `None` for anything a decoder would refuse: broken sync, reserved version,
    /// layer or sample rate, free-format or bad bitrate, reserved emphasis.
    pub fn parse(header: &[u8]) -> Option<Self> {
        let raw = RawHeader::read(header.get(..FRAME_HEADER_LEN)?).ok()?;

        if raw.sync != FRAME_SYNC {
            return None;
        }

        let version = match raw.version {
            0 => MpegVersion::Mpeg25,
            2 => MpegVersion::Mpeg2,
            3 => MpegVersion::Mpeg1,
            _ => return None,
        };

        let layer = match raw.layer {
            1 => Layer::Layer3,
            2 => Layer::Layer2,
            3 => Layer::Layer1,
            _ => return None,
        };

        let bitrate_idx = raw.bitrate_index as usize;
        let bitrate = match (version, layer) {
            (MpegVersion::Mpeg1, Layer::Layer1) => BITRATES_V1_L1[bitrate_idx],
            (MpegVersion::Mpeg1, Layer::Layer2) => BITRATES_V1_L2[bitrate_idx],
            (MpegVersion::Mpeg1, Layer::Layer3) => BITRATES_V1_L3[bitrate_idx],
            (_, Layer::Layer1) => BITRATES_V2_L1[bitrate_idx],
            (_, _) => BITRATES_V2_L23[bitrate_idx],
        };

        if bitrate == 0 {
            return None;
        }

        let sample_rate_idx = raw.sample_rate_index as usize;
        let sample_rate = match version {
            MpegVersion::Mpeg1 => SAMPLE_RATES_V1[sample_rate_idx],
            MpegVersion::Mpeg2 => SAMPLE_RATES_V2[sample_rate_idx],
            MpegVersion::Mpeg25 => SAMPLE_RATES_V25[sample_rate_idx],
        };

        if sample_rate == 0 || raw.emphasis == 2 {
            return None;
        }

        let channel_mode = match raw.channel_mode {
            0 => ChannelMode::Stereo,
            1 => ChannelMode::JointStereo,
            2 => ChannelMode::DualChannel,
            _ => ChannelMode::Mono,
        };

        let bits_per_second = bitrate * 1000;
        let padding = raw.padding as u32;
        let frame_size = match (version, layer) {
            (_, Layer::Layer1) => (12 * bits_per_second / sample_rate + padding) * 4,
            (MpegVersion::Mpeg1, _) | (_, Layer::Layer2) => {
                144 * bits_per_second / sample_rate + padding
            }
            (_, Layer::Layer3) => 72 * bits_per_second / sample_rate + padding,
        };

        let protected = !raw.protection_absent;
        let header_size = FRAME_HEADER_LEN + if protected { FRAME_CRC_LEN } else { 0 };

        Some(Self {
            version,
            layer,
            protected,
            bitrate,
            sample_rate,
            padding: raw.padding,
            channel_mode,
            header_size,
            frame_size: frame_size as usize,
        })
    }

    /// Bytes following the header (and CRC) up to the end of the frame.
    pub fn audio_size(&self) -> usize {
        self.frame_size.saturating_sub(self.header_size)
    }
}

/// Locate the next valid frame header at or after `from`.
///
/// A sync byte near the end of `buf` whose visible bits are still plausible is reported as
/// [`Probe::Truncated`]: the rest of its header has not arrived yet.
pub fn decode_frame(buf: &[u8], from: usize) -> Probe<FrameHeader> {
    let Some(tail) = buf.get(from..) else {
        return Probe::Missing;
    };

    for offset in memchr_iter(0xFF, tail).map(|i| i + from) {
        match buf.get(offset..offset + FRAME_HEADER_LEN) {
            Some(header) => {
                if let Some(header) = FrameHeader::parse(header) {
                    return Probe::Found { offset, header };
                }
            }
            None => {
                if is_header_prefix(&buf[offset..]) {
                    return Probe::Truncated { offset };
                }
            }
        }
    }

    Probe::Missing
}

fn is_header_prefix(partial: &[u8]) -> bool {
    let plausible_second = |b1: u8| {
        b1 & 0xE0 == 0xE0 && (b1 >> 3) & 0x03 != 0x01 && (b1 >> 1) & 0x03 != 0x00
    };

    match *partial {
        [0xFF] => true,
        [0xFF, b1] => plausible_second(b1),
        [0xFF, b1, b2] => plausible_second(b1) && (b2 >> 4) != 0x0F && (b2 >> 2) & 0x03 != 0x03,
        _ => false,
    }
}
