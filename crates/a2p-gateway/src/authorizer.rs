//! The payment authorizer
//!
//! Holds no mutable state of its own beyond the transaction log and the id
//! sequence. All admission decisions are delegated to the certificate
//! authority and the delegation ledger it was built with.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use a2p_crypto::hash_fields_hex;
use a2p_delegation::DelegationLedger;
use a2p_directory::CertificateAuthority;
use a2p_types::{Amount, Clock, PrincipalId, SubjectId, TransactionId};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::{AuthorizationError, GatewayConfig, Result, TransactionLog, TransactionRecord};

/// Gatekeeper for agent-initiated payments
pub struct PaymentAuthorizer {
    config: GatewayConfig,
    authority: Arc<CertificateAuthority>,
    ledger: Arc<DelegationLedger>,
    clock: Arc<dyn Clock>,
    transactions: TransactionLog,
    sequence: AtomicU64,
}

impl PaymentAuthorizer {
    /// Create an authorizer over an authority and a ledger.
    ///
    /// Transaction timestamps come from the authority's clock.
    pub fn new(authority: Arc<CertificateAuthority>, ledger: Arc<DelegationLedger>) -> Self {
        Self::with_config(GatewayConfig::default(), authority, ledger)
    }

    pub fn with_config(
        config: GatewayConfig,
        authority: Arc<CertificateAuthority>,
        ledger: Arc<DelegationLedger>,
    ) -> Self {
        let clock = authority.clock();
        Self {
            config,
            authority,
            ledger,
            clock,
            transactions: TransactionLog::new(),
            sequence: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn authority(&self) -> &Arc<CertificateAuthority> {
        &self.authority
    }

    pub fn ledger(&self) -> &Arc<DelegationLedger> {
        &self.ledger
    }

    /// Authorize a payment of `amount` by `agent_id` on behalf of `principal_id`.
    ///
    /// Gates, in order:
    /// 1. the agent's certificate must verify as valid
    /// 2. the agent must hold the configured capability, if one is configured
    /// 3. the delegation must have room for `amount`; the spend is committed
    ///    in the same step
    ///
    /// Only when every gate passes is a transaction recorded and its id
    /// returned.
    pub fn authorize(
        &self,
        agent_id: &SubjectId,
        principal_id: &PrincipalId,
        amount: Amount,
    ) -> Result<TransactionId> {
        self.admit(agent_id, principal_id, amount)
            .map(|record| record.transaction_id)
    }

    /// Same as [`authorize`](Self::authorize) but returns the full record
    pub fn admit(
        &self,
        agent_id: &SubjectId,
        principal_id: &PrincipalId,
        amount: Amount,
    ) -> Result<TransactionRecord> {
        let outcome = self.run_gates(agent_id, principal_id, amount);

        match &outcome {
            Ok(record) => info!(
                transaction_id = %record.transaction_id,
                agent_id = %agent_id,
                principal_id = %principal_id,
                amount = %amount,
                "Payment authorized"
            ),
            Err(denial) => warn!(
                agent_id = %agent_id,
                principal_id = %principal_id,
                amount = %amount,
                code = denial.code(),
                reason = %denial,
                "Payment denied"
            ),
        }
        outcome
    }

    fn run_gates(
        &self,
        agent_id: &SubjectId,
        principal_id: &PrincipalId,
        amount: Amount,
    ) -> Result<TransactionRecord> {
        let status = self.authority.verify(agent_id);
        if !status.is_valid() {
            return Err(AuthorizationError::CertificateInvalid(status));
        }

        if let Some(capability) = &self.config.required_capability {
            if !self.authority.has_capability(agent_id, capability) {
                return Err(AuthorizationError::CapabilityMissing {
                    capability: capability.clone(),
                });
            }
        }

        self.ledger.commit(principal_id, agent_id, amount)?;

        let timestamp = self.clock.now();
        let mut record = TransactionRecord {
            transaction_id: self.next_transaction_id(agent_id, principal_id, amount, timestamp),
            agent_id: agent_id.clone(),
            principal_id: principal_id.clone(),
            amount,
            timestamp,
        };
        // a truncated digest can collide; the sequence moves on, so the next id differs
        while let Err(rejected) = self.transactions.append(record.clone()) {
            warn!(transaction_id = %rejected.transaction_id, "Transaction id collision, regenerating");
            record.transaction_id =
                self.next_transaction_id(agent_id, principal_id, amount, timestamp);
        }
        Ok(record)
    }

    /// Digest of the payment fields plus a per-authorizer sequence number,
    /// so repeated identical payments at the same instant still differ.
    fn next_transaction_id(
        &self,
        agent_id: &SubjectId,
        principal_id: &PrincipalId,
        amount: Amount,
        timestamp: DateTime<Utc>,
    ) -> TransactionId {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let nanos = timestamp.timestamp_nanos_opt().unwrap_or_else(|| timestamp.timestamp_micros());

        let digest = hash_fields_hex(&[
            agent_id.as_str().as_bytes(),
            principal_id.as_str().as_bytes(),
            &amount.value().to_be_bytes(),
            &nanos.to_be_bytes(),
            &sequence.to_be_bytes(),
        ]);
        TransactionId::new(&digest[..self.config.id_len()])
    }

    /// All accepted transactions in order
    pub fn transactions(&self) -> Vec<TransactionRecord> {
        self.transactions.all()
    }

    pub fn transaction(&self, transaction_id: &TransactionId) -> Option<TransactionRecord> {
        self.transactions.get(transaction_id)
    }

    pub fn transactions_for_agent(&self, agent_id: &SubjectId) -> Vec<TransactionRecord> {
        self.transactions.for_agent(agent_id)
    }
}
