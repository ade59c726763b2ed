#![forbid(unsafe_code)]

use std::io::{ErrorKind, Read};

use crate::pkg::error::{PkgError, PkgResult};

pub fn read_exact<const N: usize>(r: &mut dyn Read) -> PkgResult<[u8; N]> {
    let mut buf = [0u8; N];
    fill(r, &mut buf)?;
    Ok(buf)
}

/// `read_exact` that reports a short read as a truncated package.
pub fn fill(r: &mut dyn Read, buf: &mut [u8]) -> PkgResult<()> {
    r.read_exact(buf).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => PkgError::Format("unexpected end of data".into()),
        _ => PkgError::Io(e),
    })
}

pub fn read_u8(r: &mut dyn Read) -> PkgResult<u8> {
    Ok(read_exact::<1>(r)?[0])
}

pub fn read_u32(r: &mut dyn Read) -> PkgResult<u32> {
    Ok(u32::from_be_bytes(read_exact::<4>(r)?))
}

pub fn put_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_be_bytes());
}

pub fn hex32(v: &[u8; 32]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(64);
    for b in v.iter().copied() {
        out.push(HEX[(b >> 4) as usize] as char);
        out.push(HEX[(b & 0xF) as usize] as char);
    }
    out
}
