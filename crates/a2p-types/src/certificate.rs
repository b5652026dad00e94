//! Certificate types for A2P
//!
//! A certificate binds a subject identity to its claims and issuer. The
//! claims are a closed variant: merchants carry their business license,
//! agents carry a capability set. Nothing about a certificate changes after
//! issuance except the revocation flag, which only ever goes false → true.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::SubjectId;

/// Kind of certified subject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    Merchant,
    Agent,
}

impl fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Merchant => f.write_str("merchant"),
            Self::Agent => f.write_str("agent"),
        }
    }
}

/// Per-kind claims carried by a certificate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SubjectClaims {
    /// A merchant vouched for by the authority
    Merchant { business_license: String },
    /// A software agent operated by a merchant
    Agent { capabilities: BTreeSet<String> },
}

impl SubjectClaims {
    pub fn kind(&self) -> SubjectKind {
        match self {
            Self::Merchant { .. } => SubjectKind::Merchant,
            Self::Agent { .. } => SubjectKind::Agent,
        }
    }
}

/// Who issued a certificate
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Issuer {
    /// The certificate authority itself (merchant certificates)
    Authority(String),
    /// The operating merchant (agent certificates)
    Merchant(SubjectId),
}

impl Issuer {
    pub fn id(&self) -> &str {
        match self {
            Self::Authority(id) => id,
            Self::Merchant(id) => id.as_str(),
        }
    }
}

/// One link in a certificate's signature chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateSignature {
    /// Identity of the signer (authority id or merchant subject id)
    pub signer_id: String,
    /// Hex-encoded public key of the signer
    pub public_key: String,
    /// Hex-encoded signature over the certificate's signable body
    pub signature: String,
}

/// An issued certificate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    pub subject_id: SubjectId,
    pub claims: SubjectClaims,
    pub issuer: Issuer,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Ordered signature chain; the authority's signature comes first
    pub signatures: Vec<CertificateSignature>,
    revoked: bool,
}

/// The part of a certificate covered by signatures
///
/// Excludes the revocation flag and the signatures themselves so that
/// revocation never invalidates the chain.
#[derive(Debug, Serialize)]
pub struct SignableCertificate<'a> {
    pub subject_id: &'a SubjectId,
    pub claims: &'a SubjectClaims,
    pub issuer: &'a Issuer,
    pub issued_at: &'a DateTime<Utc>,
    pub expires_at: &'a DateTime<Utc>,
}

impl Certificate {
    /// Create an unsigned, unrevoked certificate
    pub fn new(
        subject_id: SubjectId,
        claims: SubjectClaims,
        issuer: Issuer,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            subject_id,
            claims,
            issuer,
            issued_at,
            expires_at,
            signatures: Vec::new(),
            revoked: false,
        }
    }

    pub fn kind(&self) -> SubjectKind {
        self.claims.kind()
    }

    /// Capabilities granted to the subject; always empty for merchants
    pub fn capabilities(&self) -> Vec<&str> {
        match &self.claims {
            SubjectClaims::Merchant { .. } => Vec::new(),
            SubjectClaims::Agent { capabilities } => {
                capabilities.iter().map(String::as_str).collect()
            }
        }
    }

    pub fn has_capability(&self, capability: &str) -> bool {
        match &self.claims {
            SubjectClaims::Merchant { .. } => false,
            SubjectClaims::Agent { capabilities } => capabilities.contains(capability),
        }
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked
    }

    /// Mark the certificate revoked. There is no way back.
    pub fn mark_revoked(&mut self) {
        self.revoked = true;
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Status judged from this copy alone
    ///
    /// Authorities must consult their revocation record before trusting this,
    /// since a stale copy may predate revocation.
    pub fn status_at(&self, now: DateTime<Utc>) -> CertificateStatus {
        if self.revoked {
            CertificateStatus::Revoked
        } else if self.is_expired_at(now) {
            CertificateStatus::Expired
        } else {
            CertificateStatus::Valid
        }
    }

    pub fn signable(&self) -> SignableCertificate<'_> {
        SignableCertificate {
            subject_id: &self.subject_id,
            claims: &self.claims,
            issuer: &self.issuer,
            issued_at: &self.issued_at,
            expires_at: &self.expires_at,
        }
    }
}

/// Outcome of a certificate validity check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificateStatus {
    Valid,
    NotFound,
    Revoked,
    Expired,
}

impl CertificateStatus {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Valid => "certificate_valid",
            Self::NotFound => "certificate_not_found",
            Self::Revoked => "certificate_revoked",
            Self::Expired => "certificate_expired",
        }
    }
}

impl fmt::Display for CertificateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid => f.write_str("valid"),
            Self::NotFound => f.write_str("certificate not found"),
            Self::Revoked => f.write_str("certificate revoked"),
            Self::Expired => f.write_str("certificate expired"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn agent_cert(now: DateTime<Utc>) -> Certificate {
        Certificate::new(
            SubjectId::new("A1"),
            SubjectClaims::Agent {
                capabilities: ["payment".to_string(), "shopping".to_string()]
                    .into_iter()
                    .collect(),
            },
            Issuer::Merchant(SubjectId::new("M1")),
            now,
            now + Duration::days(365),
        )
    }

    #[test]
    fn test_merchant_has_no_capabilities() {
        let now = Utc::now();
        let cert = Certificate::new(
            SubjectId::new("M1"),
            SubjectClaims::Merchant {
                business_license: "L1".to_string(),
            },
            Issuer::Authority("AgentDirectory".to_string()),
            now,
            now + Duration::days(365),
        );
        assert_eq!(cert.kind(), SubjectKind::Merchant);
        assert!(cert.capabilities().is_empty());
        assert!(!cert.has_capability("payment"));
    }

    #[test]
    fn test_status_transitions() {
        let now = Utc::now();
        let mut cert = agent_cert(now);
        assert_eq!(cert.status_at(now), CertificateStatus::Valid);
        assert_eq!(
            cert.status_at(now + Duration::days(365)),
            CertificateStatus::Expired
        );

        cert.mark_revoked();
        assert!(cert.is_revoked());
        assert_eq!(cert.status_at(now), CertificateStatus::Revoked);
        // revocation wins over expiry
        assert_eq!(
            cert.status_at(now + Duration::days(400)),
            CertificateStatus::Revoked
        );
    }

    #[test]
    fn test_capabilities_sorted() {
        let cert = agent_cert(Utc::now());
        assert_eq!(cert.capabilities(), vec!["payment", "shopping"]);
        assert!(cert.has_capability("payment"));
    }

    #[test]
    fn test_signable_ignores_revocation() {
        let now = Utc::now();
        let mut cert = agent_cert(now);
        let before = serde_json::to_vec(&cert.signable()).unwrap();
        cert.mark_revoked();
        let after = serde_json::to_vec(&cert.signable()).unwrap();
        assert_eq!(before, after);
    }
}
