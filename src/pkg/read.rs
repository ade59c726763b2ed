#![forbid(unsafe_code)]

use std::io::Cursor;

use crate::pkg::error::{PkgError, PkgResult};
use crate::pkg::format::{FileEntry, FileTable, Header, MARKER_HEAD, MARKER_TAIL, MAX_NAME_LEN};
use crate::pkg::io::{fill, read_u32, read_u8};

/// Smallest possible index row: name length, offset, size.
const MIN_ENTRY_LEN: usize = 12;

pub(crate) fn read_header(cur: &mut Cursor<&[u8]>) -> PkgResult<Header> {
    let head = read_u8(cur)?;
    let info = read_u32(cur)?;
    let index_len = read_u32(cur)?;
    let body_len = read_u32(cur)?;
    let tail = read_u8(cur)?;

    if head != MARKER_HEAD || tail != MARKER_TAIL {
        return Err(PkgError::Format(format!(
            "bad markers: {head:#04x}/{tail:#04x}, expected {MARKER_HEAD:#04x}/{MARKER_TAIL:#04x}"
        )));
    }

    Ok(Header {
        info,
        index_len,
        body_len,
    })
}

/// Decode header and index of a plaintext container.
pub fn parse(plain: &[u8]) -> PkgResult<FileTable> {
    let mut cur = Cursor::new(plain);
    let header = read_header(&mut cur)?;

    let count = read_u32(&mut cur)? as usize;
    let remaining = plain.len().saturating_sub(cur.position() as usize);
    let mut entries = Vec::with_capacity(count.min(remaining / MIN_ENTRY_LEN));

    for i in 0..count {
        let name_len = read_u32(&mut cur)?;
        if name_len > MAX_NAME_LEN {
            return Err(PkgError::Format(format!(
                "entry {i}: name length {name_len} exceeds {MAX_NAME_LEN}"
            )));
        }

        let left = plain.len().saturating_sub(cur.position() as usize);
        if name_len as usize > left {
            return Err(PkgError::Format(format!(
                "entry {i}: name length {name_len} past end of index"
            )));
        }

        let mut name = vec![0u8; name_len as usize];
        fill(&mut cur, &mut name)?;
        let offset = read_u32(&mut cur)?;
        let size = read_u32(&mut cur)?;

        entries.push(FileEntry { name, offset, size });
    }

    Ok(FileTable { header, entries })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pkg::build::{build_container, Source};

    fn sources() -> Vec<Source> {
        vec![
            Source::new("/a.txt", b"hello".to_vec()),
            Source::new("/sub/b.json", br#"{"a":1}"#.to_vec()),
            Source::new("/empty", Vec::new()),
        ]
    }

    #[test]
    fn parses_entries_in_index_order() {
        let plain = build_container(&sources());
        let table = parse(&plain).unwrap();

        assert_eq!(table.len(), 3);
        let names: Vec<_> = table.iter().map(|e| e.name_lossy()).collect();
        assert_eq!(names, ["/a.txt", "/sub/b.json", "/empty"]);

        for (entry, src) in table.iter().zip(sources()) {
            let range = entry.range(plain.len()).unwrap();
            assert_eq!(&plain[range], &src.data[..]);
        }
    }

    #[test]
    fn header_lengths_are_informational() {
        let mut plain = build_container(&sources());
        plain[5..9].copy_from_slice(&0xFFFF_FFFFu32.to_be_bytes());
        plain[9..13].copy_from_slice(&0u32.to_be_bytes());
        assert_eq!(parse(&plain).unwrap().len(), 3);
    }

    #[test]
    fn empty_table() {
        let plain = build_container(&[]);
        let table = parse(&plain).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn bad_head_marker() {
        let mut plain = build_container(&sources());
        plain[0] = 0xBF;
        assert!(matches!(parse(&plain), Err(PkgError::Format(_))));
    }

    #[test]
    fn bad_tail_marker() {
        let mut plain = build_container(&sources());
        plain[13] = 0x00;
        assert!(matches!(parse(&plain), Err(PkgError::Format(_))));
    }

    #[test]
    fn oversize_name_rejected_before_read() {
        let mut plain = build_container(&sources());
        // first entry's name length follows the 14 byte header and the count
        plain[18..22].copy_from_slice(&(MAX_NAME_LEN + 1).to_be_bytes());
        let err = parse(&plain).unwrap_err();
        assert!(err.to_string().contains("exceeds"), "{err}");
    }

    #[test]
    fn truncated_index() {
        let plain = build_container(&sources());
        let cut = &plain[..30];
        assert!(matches!(parse(cut), Err(PkgError::Format(_))));
    }

    #[test]
    fn count_larger_than_index() {
        let mut plain = build_container(&sources());
        plain[14..18].copy_from_slice(&1_000_000u32.to_be_bytes());
        assert!(matches!(parse(&plain), Err(PkgError::Format(_))));
    }

    #[test]
    fn empty_input() {
        assert!(matches!(parse(&[]), Err(PkgError::Format(_))));
    }
}
