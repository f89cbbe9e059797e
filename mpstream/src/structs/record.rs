use crate::structs::frame::{FrameHeader, decode_frame};
use crate::structs::tag::{TAG_FOOTER_LEN, TAG_HEADER_LEN, TagHeader, decode_tag};

/// Outcome of searching a buffer for one kind of header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe<T> {
    /// A complete, valid header starts at `offset`.
    Found { offset: usize, header: T },
    /// The buffer ends inside something that may still become a header at `offset`.
    Truncated { offset: usize },
    /// Nothing in the searched bytes can start a header.
    Missing,
}

impl<T> Probe<T> {
    pub fn offset(&self) -> Option<usize> {
        match *self {
            Probe::Found { offset, .. } | Probe::Truncated { offset } => Some(offset),
            Probe::Missing => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Probe<U> {
        match self {
            Probe::Found { offset, header } => Probe::Found {
                offset,
                header: f(header),
            },
            Probe::Truncated { offset } => Probe::Truncated { offset },
            Probe::Missing => Probe::Missing,
        }
    }
}

/// Measurements of one record; never owns its bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Record {
    Frame {
        header_size: usize,
        audio_size: usize,
    },
    /// `size` is the declared payload size, excluding header and footer.
    Tag { size: usize, has_footer: bool },
}

impl Record {
    pub fn total_len(&self) -> usize {
        match *self {
            Record::Frame {
                header_size,
                audio_size,
            } => header_size + audio_size,
            Record::Tag { size, has_footer } => {
                size + TAG_HEADER_LEN + if has_footer { TAG_FOOTER_LEN } else { 0 }
            }
        }
    }
}

impl From<FrameHeader> for Record {
    fn from(header: FrameHeader) -> Self {
        Record::Frame {
            header_size: header.header_size,
            audio_size: header.audio_size(),
        }
    }
}

impl From<TagHeader> for Record {
    fn from(header: TagHeader) -> Self {
        Record::Tag {
            size: header.declared_size as usize,
            has_footer: header.has_footer,
        }
    }
}

/// What starts at or after a scan position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classified {
    Record { offset: usize, record: Record },
    Truncated { offset: usize },
    Unrecognized,
}

impl From<Probe<Record>> for Classified {
    fn from(probe: Probe<Record>) -> Self {
        match probe {
            Probe::Found { offset, header } => Classified::Record {
                offset,
                record: header,
            },
            Probe::Truncated { offset } => Classified::Truncated { offset },
            Probe::Missing => Classified::Unrecognized,
        }
    }
}

/// Finds the next record in a buffer.
///
/// Implementations are pure: no I/O, no state, and nothing past `buf.len()` is read.
pub trait RecordDecoder {
    fn classify(&self, buf: &[u8], from: usize) -> Classified;
}

/// MPEG audio frames and ID3v2 tags, whichever starts first.
#[derive(Debug, Default, Clone, Copy)]
pub struct MpegDecoder;

impl RecordDecoder for MpegDecoder {
    fn classify(&self, buf: &[u8], from: usize) -> Classified {
        let tag = decode_tag(buf, from).map(Record::from);
        let frame = decode_frame(buf, from).map(Record::from);

        match (tag.offset(), frame.offset()) {
            (Some(t), Some(f)) if f < t => frame.into(),
            (Some(_), _) => tag.into(),
            (None, _) => frame.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME_HEADER: [u8; 4] = [0xFF, 0xE3, 0x14, 0xC0];
    const TAG_HEADER: [u8; 10] = [b'I', b'D', b'3', 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x02];

    #[test]
    fn earliest_record_wins() {
        let mut buf = vec![0x01, 0x02];
        buf.extend_from_slice(&TAG_HEADER);
        buf.extend_from_slice(&[0x00, 0x00]);
        buf.extend_from_slice(&FRAME_HEADER);
        buf.extend(vec![0u8; 44]);

        assert_eq!(
            MpegDecoder.classify(&buf, 0),
            Classified::Record {
                offset: 2,
                record: Record::Tag {
                    size: 2,
                    has_footer: false
                }
            }
        );

        assert_eq!(
            MpegDecoder.classify(&buf, 3),
            Classified::Record {
                offset: 14,
                record: Record::Frame {
                    header_size: 4,
                    audio_size: 44
                }
            }
        );
    }

    #[test]
    fn truncated_and_unrecognized() {
        let buf = [0x01, 0x02, 0x03, b'I', b'D'];
        assert_eq!(
            MpegDecoder.classify(&buf, 0),
            Classified::Truncated { offset: 3 }
        );

        let buf = [0x01, 0x02, 0x03, 0xFF, 0xE3];
        assert_eq!(
            MpegDecoder.classify(&buf, 0),
            Classified::Truncated { offset: 3 }
        );

        assert_eq!(
            MpegDecoder.classify(&[0x10; 64], 0),
            Classified::Unrecognized
        );
        assert_eq!(MpegDecoder.classify(&[], 0), Classified::Unrecognized);
    }

    #[test]
    fn record_lengths() {
        let frame = Record::Frame {
            header_size: 6,
            audio_size: 412,
        };
        assert_eq!(frame.total_len(), 418);

        let tag = Record::Tag {
            size: 100,
            has_footer: true,
        };
        assert_eq!(tag.total_len(), 120);
    }
}
