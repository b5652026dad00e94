//! A2P Gateway - Payment authorization for agent-initiated payments
//!
//! Every payment attempt passes through an ordered pipeline of hard gates:
//!
//! ```text
//! certificate validity → (capability) → delegation capacity + commit → transaction record
//! ```
//!
//! The pipeline stops at the first failing gate. A denial leaves the
//! delegation ledger and the transaction log exactly as they were.
//!
//! The gateway only reserves delegation headroom. Moving funds is the job of
//! whatever settles the returned transaction.

pub mod authorizer;
pub mod config;
pub mod transaction;

pub use authorizer::PaymentAuthorizer;
pub use config::GatewayConfig;
pub use transaction::{TransactionLog, TransactionRecord};

use a2p_delegation::DelegationError;
use a2p_types::CertificateStatus;
use thiserror::Error;

/// Why a payment was denied
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationError {
    #[error("Agent verification failed: {0}")]
    CertificateInvalid(CertificateStatus),

    #[error("Agent lacks required capability: {capability}")]
    CapabilityMissing { capability: String },

    #[error("Delegation check failed: {0}")]
    DelegationDenied(DelegationError),
}

impl AuthorizationError {
    /// Stable machine-readable code for the denial
    pub fn code(&self) -> &'static str {
        match self {
            Self::CertificateInvalid(status) => status.code(),
            Self::CapabilityMissing { .. } => "capability_missing",
            Self::DelegationDenied(err) => err.code(),
        }
    }
}

impl From<DelegationError> for AuthorizationError {
    fn from(err: DelegationError) -> Self {
        Self::DelegationDenied(err)
    }
}

pub type Result<T> = std::result::Result<T, AuthorizationError>;
