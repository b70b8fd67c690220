//! SHA-256 data hashes over canonical bytes

use crate::canonical::Canonical;
use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 digest of the given bytes
pub fn digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Recompute the digest and compare it to a stored one
pub fn verify(bytes: &[u8], expected: &str) -> bool {
    digest(bytes).eq_ignore_ascii_case(expected)
}

/// Data hash of a record's canonical fields
pub fn hash_record<C: Canonical + ?Sized>(record: &C) -> String {
    digest(&record.canonical_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::CanonicalEncoder;
    use rust_decimal_macros::dec;

    #[test]
    fn test_digest_known_value() {
        assert_eq!(
            digest(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_digest_is_fixed_length() {
        assert_eq!(digest(b"").len(), 64);
        assert_eq!(digest(&[0u8; 4096]).len(), 64);
    }

    #[test]
    fn test_hash_deterministic() {
        let bytes = CanonicalEncoder::new("t").decimal(dec!(12.5)).finish();
        assert_eq!(digest(&bytes), digest(&bytes));
    }

    #[test]
    fn test_verify_detects_change() {
        let original = CanonicalEncoder::new("t").decimal(dec!(5000)).finish();
        let changed = CanonicalEncoder::new("t").decimal(dec!(5001)).finish();
        let stored = digest(&original);
        assert!(verify(&original, &stored));
        assert!(!verify(&changed, &stored));
    }

    #[test]
    fn test_verify_rejects_garbage() {
        assert!(!verify(b"data", "not-a-digest"));
        assert!(!verify(b"data", ""));
    }
}
