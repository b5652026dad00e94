//! The Certificate Authority
//!
//! Issues merchant certificates under its own name and agent certificates
//! under a merchant, signs each with its Ed25519 key, and answers validity
//! checks against its revocation record and the clock.

use std::collections::BTreeSet;
use std::sync::Arc;

use a2p_crypto::{sign_json, verify_json, Keypair};
use a2p_types::{
    Certificate, CertificateSignature, CertificateStatus, Clock, Issuer, SubjectClaims,
    SubjectId, SubjectKind, SystemClock,
};
use tracing::{debug, info, warn};

use crate::{AuthorityConfig, CertificateStore, DirectoryError, Result};

/// Certificate Authority for merchants and agents
pub struct CertificateAuthority {
    config: AuthorityConfig,
    keypair: Keypair,
    store: CertificateStore,
    clock: Arc<dyn Clock>,
}

impl CertificateAuthority {
    /// Create an authority with a fresh key and the system clock
    pub fn new(config: AuthorityConfig) -> Self {
        Self::with_parts(config, Keypair::generate(), Arc::new(SystemClock))
    }

    /// Create with a specific keypair and clock (for tests or persistence)
    pub fn with_parts(config: AuthorityConfig, keypair: Keypair, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            keypair,
            store: CertificateStore::new(),
            clock,
        }
    }

    pub fn config(&self) -> &AuthorityConfig {
        &self.config
    }

    pub fn authority_id(&self) -> &str {
        &self.config.authority_id
    }

    pub fn public_key(&self) -> String {
        self.keypair.public_key_hex()
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    /// Register a merchant, issuing a certificate signed by the authority
    pub fn register_merchant(
        &self,
        merchant_id: impl Into<SubjectId>,
        business_license: impl Into<String>,
    ) -> Result<Certificate> {
        let merchant_id = merchant_id.into();
        ensure_subject(&merchant_id)?;

        let business_license = business_license.into();
        if business_license.trim().is_empty() {
            return Err(DirectoryError::InvalidSubject {
                message: format!("merchant {} has an empty business license", merchant_id),
            });
        }

        // Avoid signing for a taken id; store_new still re-checks under the shard lock.
        if self.store.contains(&merchant_id) {
            return Err(DirectoryError::DuplicateSubject {
                subject_id: merchant_id,
            });
        }

        let certificate = self.issue(
            merchant_id,
            SubjectClaims::Merchant { business_license },
            Issuer::Authority(self.config.authority_id.clone()),
            None,
        )?;
        self.store_new(certificate)
    }

    /// Register an agent operated by `merchant_id`
    pub fn register_agent<I, S>(
        &self,
        agent_id: impl Into<SubjectId>,
        merchant_id: impl Into<SubjectId>,
        capabilities: I,
    ) -> Result<Certificate>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.register_agent_inner(agent_id.into(), merchant_id.into(), collect(capabilities), None)
    }

    /// Register an agent and append the merchant's co-signature to the chain
    pub fn register_agent_cosigned<I, S>(
        &self,
        agent_id: impl Into<SubjectId>,
        merchant_id: impl Into<SubjectId>,
        capabilities: I,
        merchant_key: &Keypair,
    ) -> Result<Certificate>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.register_agent_inner(
            agent_id.into(),
            merchant_id.into(),
            collect(capabilities),
            Some(merchant_key),
        )
    }

    fn register_agent_inner(
        &self,
        agent_id: SubjectId,
        merchant_id: SubjectId,
        capabilities: BTreeSet<String>,
        merchant_key: Option<&Keypair>,
    ) -> Result<Certificate> {
        ensure_subject(&agent_id)?;

        let issuer_is_merchant = self
            .store
            .with_certificate(&merchant_id, |c| c.kind() == SubjectKind::Merchant)
            .unwrap_or(false);
        if !issuer_is_merchant || !self.verify(&merchant_id).is_valid() {
            warn!(
                agent_id = %agent_id,
                merchant_id = %merchant_id,
                code = "unknown_issuer",
                "Agent registration rejected"
            );
            return Err(DirectoryError::UnknownIssuer { merchant_id });
        }

        if self.store.contains(&agent_id) {
            return Err(DirectoryError::DuplicateSubject {
                subject_id: agent_id,
            });
        }

        let certificate = self.issue(
            agent_id,
            SubjectClaims::Agent { capabilities },
            Issuer::Merchant(merchant_id.clone()),
            merchant_key.map(|key| (merchant_id.as_str(), key)),
        )?;
        self.store_new(certificate)
    }

    /// Build and sign a certificate. The authority always signs first.
    fn issue(
        &self,
        subject_id: SubjectId,
        claims: SubjectClaims,
        issuer: Issuer,
        cosigner: Option<(&str, &Keypair)>,
    ) -> Result<Certificate> {
        let issued_at = self.clock.now();
        let Some(expires_at) = issued_at.checked_add_signed(self.config.validity) else {
            return Err(DirectoryError::ValidityOverflow { subject_id });
        };
        let mut certificate = Certificate::new(subject_id, claims, issuer, issued_at, expires_at);

        let signature = sign_json(&self.keypair, &certificate.signable())?;
        certificate.signatures.push(CertificateSignature {
            signer_id: self.config.authority_id.clone(),
            public_key: self.keypair.public_key_hex(),
            signature,
        });

        if let Some((signer_id, key)) = cosigner {
            let signature = sign_json(key, &certificate.signable())?;
            certificate.signatures.push(CertificateSignature {
                signer_id: signer_id.to_string(),
                public_key: key.public_key_hex(),
                signature,
            });
        }

        Ok(certificate)
    }

    fn store_new(&self, certificate: Certificate) -> Result<Certificate> {
        self.store
            .insert_new(certificate.clone())
            .map_err(|rejected| DirectoryError::DuplicateSubject {
                subject_id: rejected.subject_id,
            })?;

        info!(
            subject_id = %certificate.subject_id,
            kind = %certificate.kind(),
            issuer = certificate.issuer.id(),
            expires_at = %certificate.expires_at,
            "Certificate issued"
        );
        Ok(certificate)
    }

    /// Check whether a subject's certificate is currently valid.
    ///
    /// The revocation record is consulted before expiry and before the
    /// certificate's own flag.
    pub fn verify(&self, subject_id: &SubjectId) -> CertificateStatus {
        let now = self.clock.now();
        let status = match self.store.with_certificate(subject_id, |c| c.status_at(now)) {
            None => CertificateStatus::NotFound,
            Some(_) if self.store.is_revoked(subject_id) => CertificateStatus::Revoked,
            Some(status) => status,
        };
        debug!(subject_id = %subject_id, status = status.code(), "Certificate verified");
        status
    }

    /// Validity check against a certificate copy the caller presents.
    ///
    /// A stale copy that predates revocation is still rejected.
    pub fn verify_presented(&self, certificate: &Certificate) -> CertificateStatus {
        if !self.store.contains(&certificate.subject_id) {
            return CertificateStatus::NotFound;
        }
        if self.store.is_revoked(&certificate.subject_id) {
            return CertificateStatus::Revoked;
        }
        certificate.status_at(self.clock.now())
    }

    /// Revoke a subject. Idempotent.
    ///
    /// Revoking a merchant does not revoke the agents it operates.
    pub fn revoke(&self, subject_id: &SubjectId) {
        let newly_revoked = self.store.record_revocation(subject_id);

        let is_agent = self
            .store
            .with_certificate(subject_id, |c| c.kind() == SubjectKind::Agent)
            .unwrap_or(false);
        if is_agent {
            self.store.flag_revoked(subject_id);
        }

        if newly_revoked {
            info!(subject_id = %subject_id, "Certificate revoked");
        }
    }

    pub fn is_revoked(&self, subject_id: &SubjectId) -> bool {
        self.store.is_revoked(subject_id)
    }

    pub fn revocation_list(&self) -> Vec<SubjectId> {
        self.store.revocation_list()
    }

    /// Snapshot of a subject's certificate
    pub fn certificate(&self, subject_id: &SubjectId) -> Option<Certificate> {
        self.store.get(subject_id)
    }

    /// Agents issued under a merchant, revoked ones included
    pub fn agents_of(&self, merchant_id: &SubjectId) -> Vec<Certificate> {
        self.store
            .filter(|c| matches!(&c.issuer, Issuer::Merchant(m) if m == merchant_id))
    }

    pub fn has_capability(&self, subject_id: &SubjectId, capability: &str) -> bool {
        self.store
            .with_certificate(subject_id, |c| c.has_capability(capability))
            .unwrap_or(false)
    }

    /// Check every signature in a subject's chain.
    ///
    /// The first signature must come from this authority's key. This is not
    /// part of [`verify`](Self::verify).
    pub fn verify_signatures(&self, subject_id: &SubjectId) -> Result<bool> {
        let certificate = self
            .store
            .get(subject_id)
            .ok_or_else(|| DirectoryError::NotFound {
                subject_id: subject_id.clone(),
            })?;

        let authority_first = certificate.signatures.first().is_some_and(|s| {
            s.signer_id == self.config.authority_id && s.public_key == self.keypair.public_key_hex()
        });
        if !authority_first {
            return Ok(false);
        }

        let signable = certificate.signable();
        for entry in &certificate.signatures {
            if !verify_json(&entry.public_key, &signable, &entry.signature)? {
                warn!(
                    subject_id = %subject_id,
                    signer_id = %entry.signer_id,
                    "Certificate signature does not verify"
                );
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Number of certificates ever issued
    pub fn issued_count(&self) -> usize {
        self.store.len()
    }
}

impl Default for CertificateAuthority {
    fn default() -> Self {
        Self::new(AuthorityConfig::default())
    }
}

fn ensure_subject(subject_id: &SubjectId) -> Result<()> {
    if subject_id.is_blank() {
        return Err(DirectoryError::InvalidSubject {
            message: "subject id must not be empty".to_string(),
        });
    }
    Ok(())
}

fn collect<I, S>(capabilities: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    capabilities.into_iter().map(Into::into).collect()
}
