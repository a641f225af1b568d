//! Content fingerprints used as matching keys.

use std::fmt;

use sha2::{Digest as _, Sha256};

/// SHA-256 of a packet's raw bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest([u8; 32]);

impl fmt::LowerHex for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(self, f)
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({:x})", self)
    }
}

/// Fingerprint packet bytes. Metadata such as the timestamp never takes part.
pub fn fingerprint(data: &[u8]) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(data);
    Digest(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_bytes_same_digest() {
        let payload = b"\x00\x11\x22\x33\x44\x55 some frame";
        assert_eq!(fingerprint(payload), fingerprint(&payload.to_vec()));
    }

    #[test]
    fn different_bytes_different_digest() {
        assert_ne!(fingerprint(b"abc"), fingerprint(b"abd"));
        assert_ne!(fingerprint(b""), fingerprint(b"\x00"));
    }

    #[test]
    fn empty_payload_is_known_sha256() {
        assert_eq!(
            fingerprint(&[]).to_string(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
