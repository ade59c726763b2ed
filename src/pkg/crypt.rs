#![forbid(unsafe_code)]

use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use aes::{Aes256, Block};
use tracing::debug;

use crate::pkg::error::{PkgError, PkgResult};
use crate::pkg::format::FRAME_PREFIX;
use crate::pkg::key::derive_key;

pub const CBC_IV: &[u8; 16] = b"the iv: 16 bytes";

/// Framing bytes in front of the cipher stream.
pub const FRAME_LEN: usize = 6;

/// Bytes covered by the CBC part.
pub const CBC_LEN: usize = 1024;

/// Bytes of the CBC plaintext that survive into the output. The last
/// decrypted byte of the block is dropped, the XOR stream starts in its place.
pub const CBC_KEPT: usize = CBC_LEN - 1;

/// XOR key used when the identifier is too short to supply one.
pub const DEFAULT_XOR_KEY: u8 = 0x66;

/// How raw package bytes turn into a plaintext container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecryptionPolicy {
    /// Package is shipped unencrypted.
    Identity,
    /// AES-256-CBC over the first 1024 bytes, single-byte XOR over the rest.
    HybridAesXor,
}

impl DecryptionPolicy {
    /// Packages are distributed unencrypted on macOS.
    pub fn for_host() -> Self {
        if cfg!(target_os = "macos") {
            DecryptionPolicy::Identity
        } else {
            DecryptionPolicy::HybridAesXor
        }
    }
}

impl Default for DecryptionPolicy {
    fn default() -> Self {
        Self::for_host()
    }
}

pub fn xor_key(identifier: &str) -> u8 {
    let id = identifier.as_bytes();
    if id.len() >= 2 {
        id[id.len() - 2]
    } else {
        DEFAULT_XOR_KEY
    }
}

fn cipher(identifier: &str) -> PkgResult<Aes256> {
    let key = derive_key(identifier);
    Aes256::new_from_slice(&key).map_err(|e| PkgError::Crypto(format!("aes key: {e}")))
}

/// Turn raw package bytes into the plaintext container.
pub fn decrypt(policy: DecryptionPolicy, identifier: &str, raw: &[u8]) -> PkgResult<Vec<u8>> {
    match policy {
        DecryptionPolicy::Identity => Ok(raw.to_vec()),
        DecryptionPolicy::HybridAesXor => decrypt_hybrid(identifier, raw),
    }
}

fn decrypt_hybrid(identifier: &str, raw: &[u8]) -> PkgResult<Vec<u8>> {
    if raw.len() < FRAME_LEN + CBC_LEN {
        return Err(PkgError::Format(format!(
            "package too short: {} bytes, need at least {}",
            raw.len(),
            FRAME_LEN + CBC_LEN
        )));
    }

    let cipher = cipher(identifier)?;
    let (head, tail) = raw[FRAME_LEN..].split_at(CBC_LEN);

    let mut block0 = [0u8; CBC_LEN];
    let mut prev = *CBC_IV;
    for (src, dst) in head.chunks_exact(16).zip(block0.chunks_exact_mut(16)) {
        let mut block = Block::clone_from_slice(src);
        cipher.decrypt_block(&mut block);
        for i in 0..16 {
            dst[i] = block[i] ^ prev[i];
        }
        prev.copy_from_slice(src);
    }

    let key = xor_key(identifier);
    let mut out = Vec::with_capacity(CBC_KEPT + tail.len());
    out.extend_from_slice(&block0[..CBC_KEPT]);
    out.extend(tail.iter().map(|b| b ^ key));

    debug!(raw = raw.len(), plain = out.len(), "decrypted package");
    Ok(out)
}

/// Inverse of [`decrypt`]. Plaintext shorter than the CBC part is zero padded;
/// the parser ignores trailing bytes.
pub fn encrypt(policy: DecryptionPolicy, identifier: &str, plain: &[u8]) -> PkgResult<Vec<u8>> {
    match policy {
        DecryptionPolicy::Identity => Ok(plain.to_vec()),
        DecryptionPolicy::HybridAesXor => encrypt_hybrid(identifier, plain),
    }
}

fn encrypt_hybrid(identifier: &str, plain: &[u8]) -> PkgResult<Vec<u8>> {
    let cipher = cipher(identifier)?;

    let mut block0 = [0u8; CBC_LEN];
    let kept = plain.len().min(CBC_KEPT);
    block0[..kept].copy_from_slice(&plain[..kept]);
    let rest = plain.get(CBC_KEPT..).unwrap_or(&[]);

    let mut out = Vec::with_capacity(FRAME_LEN + CBC_LEN + rest.len());
    out.extend_from_slice(&FRAME_PREFIX);

    let mut prev = *CBC_IV;
    for chunk in block0.chunks_exact(16) {
        let mut mixed = [0u8; 16];
        for i in 0..16 {
            mixed[i] = chunk[i] ^ prev[i];
        }
        let mut block = Block::from(mixed);
        cipher.encrypt_block(&mut block);
        prev.copy_from_slice(&block);
        out.extend_from_slice(&block);
    }

    let key = xor_key(identifier);
    out.extend(rest.iter().map(|b| b ^ key));
    Ok(out)
}
