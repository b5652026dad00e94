//! Hashing utilities

use sha2::{Digest, Sha256};

/// Hash a sequence of length-prefixed fields
pub fn hash_fields_hex(fields: &[&[u8]]) -> String {
    let mut hasher = Sha256::new();
    for field in fields {
        hasher.update((field.len() as u64).to_be_bytes());
        hasher.update(field);
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_is_hex_sha256() {
        let digest = hash_fields_hex(&[b"abc"]);
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_field_boundaries_matter() {
        let a = hash_fields_hex(&[b"ab", b"c"]);
        let b = hash_fields_hex(&[b"a", b"bc"]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_fields_hash_is_deterministic() {
        assert_eq!(
            hash_fields_hex(&[b"A1", b"P1", b"100"]),
            hash_fields_hex(&[b"A1", b"P1", b"100"])
        );
    }
}
