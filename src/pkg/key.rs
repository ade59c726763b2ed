#![forbid(unsafe_code)]

use pbkdf2::pbkdf2_hmac;
use sha1::Sha1;

pub const KDF_SALT: &[u8; 8] = b"saltiest";
pub const KDF_ITERATIONS: u32 = 1000;

/// Derive the AES-256 key for a package from its public identifier.
///
/// PBKDF2-HMAC-SHA1 with a fixed salt. The key is never stored, so this
/// must stay deterministic.
pub fn derive_key(identifier: &str) -> [u8; 32] {
    let mut key = [0u8; 32];
    pbkdf2_hmac::<Sha1>(identifier.as_bytes(), KDF_SALT, KDF_ITERATIONS, &mut key);
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_identifier_same_key() {
        let a = derive_key("wx0123456789abcdef");
        let b = derive_key("wx0123456789abcdef");
        assert_eq!(a, b);
    }

    #[test]
    fn different_identifiers_differ() {
        assert_ne!(derive_key("wx0123456789abcdef"), derive_key("wx0123456789abcdee"));
    }

    #[test]
    fn known_key_for_identifier() {
        assert_eq!(
            crate::pkg::io::hex32(&derive_key("wx0123456789abcdef")),
            "f4795e6a02f148161774416ca90082329196b3d97337a34c2013c97250e0e26e"
        );
    }

    #[test]
    fn matches_reference_pbkdf2_sha1() {
        // RFC 6070 vector: P="password", S="salt", c=1, dkLen=20.
        let mut out = [0u8; 20];
        pbkdf2_hmac::<Sha1>(b"password", b"salt", 1, &mut out);
        assert_eq!(
            out,
            [
                0x0c, 0x60, 0xc8, 0x0f, 0x96, 0x1f, 0x0e, 0x71, 0xf3, 0xa9, 0xb5, 0x24, 0xaf, 0x60,
                0x12, 0x06, 0x2f, 0xe0, 0x37, 0xa6,
            ]
        );
    }
}
