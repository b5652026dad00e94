//! Certificate store and revocation record
//!
//! Certificates and revocations live in separate concurrent maps. The
//! revocation record is authoritative on its own: a subject listed there is
//! revoked no matter what any certificate copy says.

use a2p_types::{Certificate, SubjectId};
use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};

/// In-memory store of issued certificates
#[derive(Debug, Default)]
pub struct CertificateStore {
    certificates: DashMap<SubjectId, Certificate>,
    revoked: DashSet<SubjectId>,
}

impl CertificateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a certificate for a subject that has none.
    ///
    /// Returns the rejected certificate if the subject is already taken.
    /// Check and insert happen under the same shard lock.
    pub fn insert_new(&self, certificate: Certificate) -> Result<(), Certificate> {
        match self.certificates.entry(certificate.subject_id.clone()) {
            Entry::Occupied(_) => Err(certificate),
            Entry::Vacant(slot) => {
                slot.insert(certificate);
                Ok(())
            }
        }
    }

    /// Snapshot of a certificate
    pub fn get(&self, subject_id: &SubjectId) -> Option<Certificate> {
        self.certificates.get(subject_id).map(|c| c.value().clone())
    }

    pub fn contains(&self, subject_id: &SubjectId) -> bool {
        self.certificates.contains_key(subject_id)
    }

    /// Read a certificate in place without cloning
    pub fn with_certificate<R>(&self, subject_id: &SubjectId, f: impl FnOnce(&Certificate) -> R) -> Option<R> {
        self.certificates.get(subject_id).map(|c| f(c.value()))
    }

    /// Add a subject to the revocation record.
    ///
    /// Returns `true` if the subject was not already listed.
    pub fn record_revocation(&self, subject_id: &SubjectId) -> bool {
        self.revoked.insert(subject_id.clone())
    }

    /// Set the revocation flag on a stored certificate, if present
    pub fn flag_revoked(&self, subject_id: &SubjectId) -> bool {
        match self.certificates.get_mut(subject_id) {
            Some(mut certificate) => {
                certificate.mark_revoked();
                true
            }
            None => false,
        }
    }

    pub fn is_revoked(&self, subject_id: &SubjectId) -> bool {
        self.revoked.contains(subject_id)
    }

    /// All revoked subjects, sorted
    pub fn revocation_list(&self) -> Vec<SubjectId> {
        let mut list: Vec<SubjectId> = self.revoked.iter().map(|s| s.key().clone()).collect();
        list.sort();
        list
    }

    /// Certificates matching a predicate, sorted by subject id
    pub fn filter(&self, predicate: impl Fn(&Certificate) -> bool) -> Vec<Certificate> {
        let mut matches: Vec<Certificate> = self
            .certificates
            .iter()
            .filter(|c| predicate(c.value()))
            .map(|c| c.value().clone())
            .collect();
        matches.sort_by(|a, b| a.subject_id.cmp(&b.subject_id));
        matches
    }

    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use a2p_types::{Issuer, SubjectClaims};
    use chrono::{Duration, Utc};

    fn merchant(id: &str) -> Certificate {
        let now = Utc::now();
        Certificate::new(
            SubjectId::new(id),
            SubjectClaims::Merchant {
                business_license: format!("license_{}", id),
            },
            Issuer::Authority("AgentDirectory".to_string()),
            now,
            now + Duration::days(365),
        )
    }

    #[test]
    fn test_insert_new_rejects_duplicates() {
        let store = CertificateStore::new();
        assert!(store.insert_new(merchant("M1")).is_ok());

        let rejected = store.insert_new(merchant("M1")).unwrap_err();
        assert_eq!(rejected.subject_id, SubjectId::new("M1"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_revocation_record_is_independent() {
        let store = CertificateStore::new();
        let id = SubjectId::new("ghost");

        assert!(store.record_revocation(&id));
        assert!(!store.record_revocation(&id));
        assert!(store.is_revoked(&id));
        assert!(!store.flag_revoked(&id));
        assert_eq!(store.revocation_list(), vec![id]);
    }

    #[test]
    fn test_flag_revoked_mutates_stored_copy_only() {
        let store = CertificateStore::new();
        store.insert_new(merchant("M1")).unwrap();

        let stale = store.get(&SubjectId::new("M1")).unwrap();
        assert!(store.flag_revoked(&SubjectId::new("M1")));

        assert!(!stale.is_revoked());
        assert!(store.get(&SubjectId::new("M1")).unwrap().is_revoked());
    }

    #[test]
    fn test_filter_is_sorted() {
        let store = CertificateStore::new();
        for id in ["M3", "M1", "M2"] {
            store.insert_new(merchant(id)).unwrap();
        }
        let ids: Vec<String> = store
            .filter(|_| true)
            .into_iter()
            .map(|c| c.subject_id.0)
            .collect();
        assert_eq!(ids, vec!["M1", "M2", "M3"]);
    }
}
