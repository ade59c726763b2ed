#![forbid(unsafe_code)]

use std::ops::Range;

use crate::pkg::error::{PkgError, PkgResult};

/// Leading header marker.
pub const MARKER_HEAD: u8 = 0xBE;

/// Trailing header marker, written right before the entry count.
pub const MARKER_TAIL: u8 = 0xED;

/// Fixed header size: marker, info, index length, body length, marker.
pub const HEADER_LEN: usize = 1 + 4 + 4 + 4 + 1;

/// Upper bound on a single entry name, checked before allocating it.
pub const MAX_NAME_LEN: u32 = 10 << 20;

/// Framing written in front of encrypted packages. Ignored on read.
pub const FRAME_PREFIX: [u8; 6] = *b"V1MMWX";

/// Decoded fixed header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub info: u32,
    pub index_len: u32,
    pub body_len: u32,
}

/// One row of the package index. `offset` and `size` address the decrypted buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub name: Vec<u8>,
    pub offset: u32,
    pub size: u32,
}

impl FileEntry {
    pub fn name_lossy(&self) -> String {
        String::from_utf8_lossy(&self.name).into_owned()
    }

    /// Byte range of the payload, or `Format` if it does not fit in `buf_len`.
    pub fn range(&self, buf_len: usize) -> PkgResult<Range<usize>> {
        let start = self.offset as usize;
        let end = start
            .checked_add(self.size as usize)
            .filter(|&end| end <= buf_len)
            .ok_or_else(|| {
                PkgError::Format(format!(
                    "entry {} out of bounds: offset={} size={} buffer={}",
                    self.name_lossy(),
                    self.offset,
                    self.size,
                    buf_len
                ))
            })?;
        Ok(start..end)
    }
}

/// Decoded index in on-disk order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTable {
    pub header: Header,
    pub entries: Vec<FileEntry>,
}

impl FileTable {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FileEntry> {
        self.entries.iter()
    }
}

/// Public view of an entry for `list`.
#[derive(Debug, Clone)]
pub struct EntryInfo {
    pub name: String,
    pub offset: u32,
    pub size: u32,
    /// Blake3 (hex) of the entry bytes, `None` when the range is out of bounds.
    pub hash_hex: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(offset: u32, size: u32) -> FileEntry {
        FileEntry {
            name: b"/a.txt".to_vec(),
            offset,
            size,
        }
    }

    #[test]
    fn range_inside_buffer() {
        assert_eq!(entry(2, 3).range(5).unwrap(), 2..5);
        assert_eq!(entry(5, 0).range(5).unwrap(), 5..5);
    }

    #[test]
    fn range_past_end_is_format_error() {
        let err = entry(3, 3).range(5).unwrap_err();
        assert!(matches!(err, PkgError::Format(_)));
    }

    #[test]
    fn range_does_not_overflow() {
        let err = entry(u32::MAX, u32::MAX).range(16).unwrap_err();
        assert!(matches!(err, PkgError::Format(_)));
    }
}
