//! A2P Delegation - Bounded spending authority for agents
//!
//! A principal grants an agent a spending cap. Every payment the agent makes
//! on the principal's behalf draws down that cap.
//!
//! # Invariants
//!
//! 1. `spent <= limit` after every successful commit
//! 2. `spent` never decreases except by explicit re-delegation
//! 3. Capacity check and commit for one key are a single critical section
//! 4. There is no ledger-wide lock; unrelated keys proceed independently

pub mod ledger;

pub use ledger::*;

use a2p_types::Amount;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur in delegation operations
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum DelegationError {
    #[error("Delegation limit must be positive")]
    InvalidLimit,

    #[error("Payment amount must be positive")]
    InvalidAmount,

    #[error("No delegation found")]
    NotFound,

    #[error("Delegation inactive")]
    Inactive,

    #[error("Exceeds limit: requested {requested}, available {available}")]
    Exceeds { requested: Amount, available: Amount },
}

impl DelegationError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidLimit => "delegation_invalid_limit",
            Self::InvalidAmount => "delegation_invalid_amount",
            Self::NotFound => "delegation_not_found",
            Self::Inactive => "delegation_inactive",
            Self::Exceeds { .. } => "delegation_exceeds",
        }
    }
}

pub type Result<T> = std::result::Result<T, DelegationError>;
