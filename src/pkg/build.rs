#![forbid(unsafe_code)]

use std::fs;
use std::path::Path;
use tracing::info;
use walkdir::WalkDir;

use crate::pkg::crypt::{encrypt, DecryptionPolicy};
use crate::pkg::error::{PkgError, PkgResult};
use crate::pkg::format::{HEADER_LEN, MARKER_HEAD, MARKER_TAIL, MAX_NAME_LEN};
use crate::pkg::io::put_u32;
use crate::pkg::path::normalize_rel_path;

/// A file to be packed: logical name plus contents.
#[derive(Debug, Clone)]
pub struct Source {
    pub name: String,
    pub data: Vec<u8>,
}

impl Source {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

/// Plaintext container layout:
/// - [u8 0xBE][u32 info][u32 index_len][u32 body_len][u8 0xED]
/// - [u32 entry_count]
/// - entries...
///   - [u32 name_len][name bytes][u32 offset][u32 size]
/// - body: payloads back to back, in index order
///
/// Integers are big-endian. Offsets are absolute within the container.
pub fn build_container(sources: &[Source]) -> Vec<u8> {
    let index_len: usize = 4 + sources
        .iter()
        .map(|s| 4 + s.name.len() + 4 + 4)
        .sum::<usize>();
    let body_len: usize = sources.iter().map(|s| s.data.len()).sum();

    let mut out = Vec::with_capacity(HEADER_LEN + index_len + body_len);
    out.push(MARKER_HEAD);
    put_u32(&mut out, 0);
    put_u32(&mut out, index_len as u32);
    put_u32(&mut out, body_len as u32);
    out.push(MARKER_TAIL);

    put_u32(&mut out, sources.len() as u32);
    let mut offset = HEADER_LEN + index_len;
    for s in sources {
        put_u32(&mut out, s.name.len() as u32);
        out.extend_from_slice(s.name.as_bytes());
        put_u32(&mut out, offset as u32);
        put_u32(&mut out, s.data.len() as u32);
        offset += s.data.len();
    }

    for s in sources {
        out.extend_from_slice(&s.data);
    }
    out
}

/// Collect every regular file under `input` as `/relative/path`, sorted by name.
pub fn collect_sources(input: &Path) -> PkgResult<Vec<Source>> {
    let mut sources = Vec::new();
    for ent in WalkDir::new(input).follow_links(false) {
        let ent = ent.map_err(|e| {
            let msg = e.to_string();
            let io = e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, msg));
            PkgError::Io(io)
        })?;

        if !ent.file_type().is_file() {
            continue;
        }

        let rel = normalize_rel_path(input, ent.path())?;
        if rel.len() > MAX_NAME_LEN as usize {
            return Err(PkgError::Format(format!("path too long: {rel}")));
        }
        sources.push(Source::new(format!("/{rel}"), fs::read(ent.path())?));
    }

    sources.sort_by(|a, b| a.name.as_bytes().cmp(b.name.as_bytes()));
    Ok(sources)
}

/// Pack a directory into a package file.
pub fn pack(
    input: &Path,
    output: &Path,
    identifier: &str,
    policy: DecryptionPolicy,
) -> PkgResult<usize> {
    let sources = collect_sources(input)?;
    let total: usize = sources.iter().map(|s| s.data.len()).sum();
    if total > u32::MAX as usize {
        return Err(PkgError::Format("input exceeds 4 GiB".into()));
    }

    let plain = build_container(&sources);
    let raw = encrypt(policy, identifier, &plain)?;

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(output, &raw)?;

    info!(
        files = sources.len(),
        bytes = raw.len(),
        "packed '{}' into '{}'",
        input.display(),
        output.display()
    );
    Ok(sources.len())
}
