//! Append-only record of accepted payments

use std::collections::HashMap;

use a2p_types::{Amount, PrincipalId, SubjectId, TransactionId};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// An accepted payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub transaction_id: TransactionId,
    pub agent_id: SubjectId,
    pub principal_id: PrincipalId,
    pub amount: Amount,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct LogState {
    records: Vec<TransactionRecord>,
    by_id: HashMap<TransactionId, usize>,
}

/// Transaction log. Records are only ever appended and ids never repeat.
#[derive(Debug, Default)]
pub struct TransactionLog {
    state: RwLock<LogState>,
}

impl TransactionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `record` unless its id is already taken, in which case the
    /// record is handed back untouched.
    pub fn append(&self, record: TransactionRecord) -> Result<(), TransactionRecord> {
        let mut state = self.state.write();
        if state.by_id.contains_key(&record.transaction_id) {
            return Err(record);
        }
        let index = state.records.len();
        state.by_id.insert(record.transaction_id.clone(), index);
        state.records.push(record);
        Ok(())
    }

    /// All records in acceptance order
    pub fn all(&self) -> Vec<TransactionRecord> {
        self.state.read().records.clone()
    }

    pub fn get(&self, transaction_id: &TransactionId) -> Option<TransactionRecord> {
        let state = self.state.read();
        state
            .by_id
            .get(transaction_id)
            .map(|&index| state.records[index].clone())
    }

    pub fn for_agent(&self, agent_id: &SubjectId) -> Vec<TransactionRecord> {
        self.state
            .read()
            .records
            .iter()
            .filter(|r| &r.agent_id == agent_id)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.state.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(tx: &str, agent: &str, amount: u64) -> TransactionRecord {
        TransactionRecord {
            transaction_id: TransactionId::new(tx),
            agent_id: SubjectId::new(agent),
            principal_id: PrincipalId::new("P1"),
            amount: Amount::new(amount),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_append_and_lookup() {
        let log = TransactionLog::new();
        assert!(log.is_empty());

        log.append(record("tx1", "A1", 100)).unwrap();
        log.append(record("tx2", "A2", 200)).unwrap();
        log.append(record("tx3", "A1", 300)).unwrap();

        assert_eq!(log.len(), 3);
        assert_eq!(log.get(&TransactionId::new("tx2")).unwrap().amount, Amount::new(200));
        assert!(log.get(&TransactionId::new("missing")).is_none());

        let a1: Vec<u64> = log
            .for_agent(&SubjectId::new("A1"))
            .iter()
            .map(|r| r.amount.value())
            .collect();
        assert_eq!(a1, vec![100, 300]);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let log = TransactionLog::new();
        log.append(record("tx1", "A1", 100)).unwrap();

        let rejected = log.append(record("tx1", "A2", 999)).unwrap_err();
        assert_eq!(rejected.amount, Amount::new(999));
        assert_eq!(log.len(), 1);
        assert_eq!(log.get(&TransactionId::new("tx1")).unwrap().agent_id, SubjectId::new("A1"));
    }

    #[test]
    fn test_record_serializes_flat_ids() {
        let json = serde_json::to_value(record("tx1", "A1", 100)).unwrap();
        assert_eq!(json["transaction_id"], "tx1");
        assert_eq!(json["agent_id"], "A1");
        assert_eq!(json["amount"], 100);
    }
}
