//! ID3v2 tag headers.
//!
//! Header layout (10 bytes):
//! "ID3" (3) + version (2) + flags (1) + size (4)
//!
//! The size is a sync-safe integer (7 significant bits per byte) counting the bytes after
//! the header, excluding the optional 10-byte footer announced by flag bit 4.

use memchr::memmem;

use crate::structs::record::Probe;
#[cfg(test)]
use crate::structs::record::Record;

pub const ID3_MAGIC: &[u8; 3] = b"ID3";
pub const TAG_HEADER_LEN: usize = 10;
pub const TAG_FOOTER_LEN: usize = 10;

const FLAG_FOOTER_PRESENT: u8 = 0x10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagHeader {
    pub major_version: u8,
    pub revision: u8,
    pub flags: u8,
    pub declared_size: u32,
    pub has_footer: bool,
}

impl TagHeader {
    pub fn parse(header: &[u8]) -> Option<Self> {
        let header = header.get(..TAG_HEADER_LEN)?;

        if &header[..3] != ID3_MAGIC || !is_header_prefix(header) {
            return None;
        }

        let flags = header[5];
        let declared_size = ((header[6] as u32 & 0x7F) << 21)
            | ((header[7] as u32 & 0x7F) << 14)
            | ((header[8] as u32 & 0x7F) << 7)
            | (header[9] as u32 & 0x7F);

        Some(Self {
            major_version: header[3],
            revision: header[4],
            flags,
            declared_size,
            has_footer: flags & FLAG_FOOTER_PRESENT != 0,
        })
    }
}

/// Locate the next valid tag header at or after `from`.
///
/// A magic marker (or a prefix of it) at the end of `buf` whose visible bytes are still
/// plausible is reported as [`Probe::Truncated`].
pub fn decode_tag(buf: &[u8], from: usize) -> Probe<TagHeader> {
    let Some(tail) = buf.get(from..) else {
        return Probe::Missing;
    };

    for offset in memmem::find_iter(tail, ID3_MAGIC).map(|i| i + from) {
        match buf.get(offset..offset + TAG_HEADER_LEN) {
            Some(header) => {
                if let Some(header) = TagHeader::parse(header) {
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

    // "I" or "ID" right at the end
    for len in (1..ID3_MAGIC.len()).rev() {
        if tail.ends_with(&ID3_MAGIC[..len]) {
            return Probe::Truncated {
                offset: buf.len() - len,
            };
        }
    }

    Probe::Missing
}

// Version bytes are never 0xFF, size bytes never have their top bit set.
fn is_header_prefix(partial: &[u8]) -> bool {
    partial
        .iter()
        .enumerate()
        .take(TAG_HEADER_LEN)
        .skip(ID3_MAGIC.len())
        .all(|(i, &b)| match i {
            3 | 4 => b != 0xFF,
            5 => true,
            _ => b < 0x80,
        })
}

#[test]
fn parse_tag_header() {
    // ID3v2.4, footer present, size 0x0201 sync-safe = 257
    let header = [b'I', b'D', b'3', 0x04, 0x00, 0x10, 0x00, 0x00, 0x02, 0x01];
    let tag = TagHeader::parse(&header).unwrap();

    assert_eq!(tag.major_version, 4);
    assert_eq!(tag.declared_size, 257);
    assert!(tag.has_footer);
    assert_eq!(Record::from(tag).total_len(), 257 + 20);

    let header = [b'I', b'D', b'3', 0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x7F];
    let tag = TagHeader::parse(&header).unwrap();
    assert!(!tag.has_footer);
    assert_eq!(Record::from(tag).total_len(), 127 + 10);
}

#[test]
fn reject_malformed_tag_header() {
    // size byte with the top bit set
    let header = [b'I', b'D', b'3', 0x04, 0x00, 0x00, 0x00, 0x80, 0x00, 0x00];
    assert!(TagHeader::parse(&header).is_none());

    // version 0xFF
    let header = [b'I', b'D', b'3', 0xFF, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
    assert!(TagHeader::parse(&header).is_none());

    assert!(TagHeader::parse(b"ID3\x04").is_none());
    assert!(TagHeader::parse(b"XD3\x04\x00\x00\x00\x00\x00\x00").is_none());
}

#[test]
fn decode_tag_in_buffer() {
    let mut buf = b"junk ID3 junk".to_vec();
    let start = buf.len();
    buf.extend_from_slice(&[b'I', b'D', b'3', 0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x05]);
    buf.extend_from_slice(b"hello");

    // ASCII after a stray marker still forms a plausible header
    match decode_tag(&buf, 0) {
        Probe::Found { offset, header } => {
            assert_eq!(offset, 5);
            assert_eq!(header.major_version, b' ');
        }
        other => panic!("unexpected probe {other:?}"),
    }

    match decode_tag(&buf, 6) {
        Probe::Found { offset, header } => {
            assert_eq!(offset, start);
            assert_eq!(Record::from(header).total_len(), 15);
        }
        other => panic!("unexpected probe {other:?}"),
    }
}

#[test]
fn decode_tag_reports_truncated_marker() {
    assert_eq!(decode_tag(b"abcID3\x04\x00", 0), Probe::Truncated { offset: 3 });
    assert_eq!(decode_tag(b"abcdeID", 0), Probe::Truncated { offset: 5 });
    assert_eq!(decode_tag(b"abcdeI", 0), Probe::Truncated { offset: 5 });
    assert_eq!(decode_tag(b"abcdeI", 6), Probe::Missing);
    assert_eq!(decode_tag(b"abcID3\xFF", 0), Probe::Missing);
    assert_eq!(decode_tag(b"abcdef", 0), Probe::Missing);
}
