//! A2P Types - Canonical domain types for agent-initiated payments
//!
//! This crate has zero dependencies on other a2p crates. It defines:
//!
//! - Identity types (SubjectId, PrincipalId, TransactionId)
//! - Amounts in smallest currency units
//! - Certificates as a closed variant over merchants and agents
//! - The clock abstraction used for issuance and expiry
//!
//! # Trust Flow
//!
//! ```text
//! Authority → Merchant certificate → Agent certificate → Delegation → Payment
//! ```

pub mod identity;
pub mod amount;
pub mod certificate;
pub mod clock;

pub use identity::*;
pub use amount::*;
pub use certificate::*;
pub use clock::*;

/// Version of the A2P types schema
pub const TYPES_VERSION: &str = "0.1.0";
