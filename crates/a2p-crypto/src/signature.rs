//! Detached signatures

use crate::{parse_public_key, CryptoError, CryptoResult, Keypair};
use ed25519_dalek::{Signature, Signer, Verifier};
use serde::Serialize;

/// Sign a message, returning the hex-encoded signature
pub fn sign_bytes(keypair: &Keypair, message: &[u8]) -> CryptoResult<String> {
    let signature = keypair
        .signing_key()
        .try_sign(message)
        .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;
    Ok(hex::encode(signature.to_bytes()))
}

/// Verify a hex signature against a hex public key
///
/// Returns `Ok(false)` for a well-formed signature that does not verify, and
/// an error only when the inputs cannot be parsed.
pub fn verify_bytes(public_key_hex: &str, message: &[u8], signature_hex: &str) -> CryptoResult<bool> {
    let verifying_key = parse_public_key(public_key_hex)?;

    let signature_bytes: [u8; 64] = hex::decode(signature_hex)
        .map_err(|e| CryptoError::InvalidSignatureFormat(e.to_string()))?
        .try_into()
        .map_err(|_| CryptoError::InvalidSignatureFormat("Signature must be 64 bytes".to_string()))?;

    let signature = Signature::from_bytes(&signature_bytes);
    Ok(verifying_key.verify(message, &signature).is_ok())
}

/// Canonical bytes of a serializable value
pub fn canonical_bytes<T: Serialize>(value: &T) -> CryptoResult<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

/// Sign the canonical JSON encoding of a value
pub fn sign_json<T: Serialize>(keypair: &Keypair, value: &T) -> CryptoResult<String> {
    sign_bytes(keypair, &canonical_bytes(value)?)
}

/// Verify a signature over the canonical JSON encoding of a value
pub fn verify_json<T: Serialize>(public_key_hex: &str, value: &T, signature_hex: &str) -> CryptoResult<bool> {
    verify_bytes(public_key_hex, &canonical_bytes(value)?, signature_hex)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Payload<'a> {
        subject: &'a str,
        amount: u64,
    }

    #[test]
    fn test_sign_and_verify() {
        let keypair = Keypair::generate();
        let message = b"agent A1 may pay";

        let signature = sign_bytes(&keypair, message).unwrap();
        assert!(verify_bytes(&keypair.public_key_hex(), message, &signature).unwrap());
    }

    #[test]
    fn test_wrong_message_fails() {
        let keypair = Keypair::generate();
        let signature = sign_bytes(&keypair, b"original").unwrap();
        assert!(!verify_bytes(&keypair.public_key_hex(), b"tampered", &signature).unwrap());
    }

    #[test]
    fn test_wrong_key_fails() {
        let signer = Keypair::generate();
        let other = Keypair::generate();
        let signature = sign_bytes(&signer, b"message").unwrap();
        assert!(!verify_bytes(&other.public_key_hex(), b"message", &signature).unwrap());
    }

    #[test]
    fn test_malformed_signature_is_error() {
        let keypair = Keypair::generate();
        assert!(matches!(
            verify_bytes(&keypair.public_key_hex(), b"m", "zz"),
            Err(CryptoError::InvalidSignatureFormat(_))
        ));
    }

    #[test]
    fn test_json_signature_detects_field_change() {
        let keypair = Keypair::generate();
        let signature = sign_json(&keypair, &Payload { subject: "A1", amount: 10 }).unwrap();

        let pk = keypair.public_key_hex();
        assert!(verify_json(&pk, &Payload { subject: "A1", amount: 10 }, &signature).unwrap());
        assert!(!verify_json(&pk, &Payload { subject: "A1", amount: 11 }, &signature).unwrap());
    }
}
