//! A2P Crypto - Cryptographic primitives for certificate issuance
//!
//! This crate provides:
//! - Key generation (Ed25519)
//! - Detached signatures over canonical JSON
//! - Hashing (SHA-256)
//!
//! Signing keys stay inside [`Keypair`]; only public keys and signatures
//! are ever handed out as hex.

pub mod keys;
pub mod signature;
pub mod hash;

pub use keys::*;
pub use signature::*;
pub use hash::*;

use thiserror::Error;

/// Cryptographic errors
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Invalid key format: {0}")]
    InvalidKeyFormat(String),

    #[error("Invalid signature format: {0}")]
    InvalidSignatureFormat(String),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type CryptoResult<T> = Result<T, CryptoError>;
