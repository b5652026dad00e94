//! A2P Directory - Certificate Authority for merchants and their agents
//!
//! The directory issues identity certificates and answers one question on the
//! payment path: is this subject's certificate valid right now?
//!
//! # Invariants
//!
//! 1. Subject identifiers are unique across merchants and agents
//! 2. An agent can only be issued under a currently valid merchant
//! 3. Revocation is permanent and is checked before expiry
//! 4. Certificates are never deleted, revoked ones included

pub mod authority;
pub mod config;
pub mod store;

pub use authority::CertificateAuthority;
pub use config::AuthorityConfig;
pub use store::CertificateStore;

use a2p_types::SubjectId;
use thiserror::Error;

/// Errors that can occur during directory operations
#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("Subject {subject_id} already has a certificate")]
    DuplicateSubject { subject_id: SubjectId },

    #[error("Issuer {merchant_id} has no valid merchant certificate")]
    UnknownIssuer { merchant_id: SubjectId },

    #[error("Subject {subject_id} has no certificate")]
    NotFound { subject_id: SubjectId },

    #[error("Invalid subject: {message}")]
    InvalidSubject { message: String },

    #[error("Validity window overflows the expiry date of {subject_id}")]
    ValidityOverflow { subject_id: SubjectId },

    #[error("Crypto error: {0}")]
    Crypto(#[from] a2p_crypto::CryptoError),
}

impl DirectoryError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicateSubject { .. } => "duplicate_subject",
            Self::UnknownIssuer { .. } => "unknown_issuer",
            Self::NotFound { .. } => "certificate_not_found",
            Self::InvalidSubject { .. } => "invalid_subject",
            Self::ValidityOverflow { .. } => "validity_overflow",
            Self::Crypto(_) => "crypto_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, DirectoryError>;
