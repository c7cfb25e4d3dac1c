//! Attestation Registry: proof verification and ledger anchoring.
//!
//! Attestations are evidentiary, not authorizing: no access decision reads
//! them. The registry delegates cryptographic validity to the `ProofVerifier`
//! capability, commits to the proof by hash, signs the commitment with the
//! issuer key, and anchors the record through the retrying `AnchorService`.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use tracing::{info, instrument, warn};

use crate::anchor::AnchorService;
use crate::crypto::{compute_proof_commitment, IssuerSigningKey};
use crate::domain::{Address, Attestation, AttestationType, Hash256};
use crate::infra::{
    AttestationRecord, AttestationStore, BrokerError, ProofVerifier, Result,
};

/// Configuration for the attestation registry.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Lifetime of a freshly issued attestation (default 1 year).
    pub attestation_validity: ChronoDuration,
    /// Timeout applied to each proof-verifier call.
    pub verifier_timeout: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            attestation_validity: ChronoDuration::days(365),
            verifier_timeout: Duration::from_secs(10),
        }
    }
}

/// Stores identity attestations, hash-anchored and expiring.
pub struct AttestationRegistry {
    verifier: Arc<dyn ProofVerifier>,
    anchor_service: AnchorService,
    store: Arc<dyn AttestationStore>,
    issuer: IssuerSigningKey,
    config: RegistryConfig,
}

impl AttestationRegistry {
    pub fn new(
        verifier: Arc<dyn ProofVerifier>,
        anchor_service: AnchorService,
        store: Arc<dyn AttestationStore>,
        issuer: IssuerSigningKey,
        config: RegistryConfig,
    ) -> Self {
        Self {
            verifier,
            anchor_service,
            store,
            issuer,
            config,
        }
    }

    /// Hex-encoded issuer public key.
    pub fn issuer_public_key(&self) -> String {
        self.issuer.public_key_hex()
    }

    /// Verify a proof and anchor the resulting attestation.
    ///
    /// Fails with `ProofInvalid` if the signal list is empty or the verifier
    /// rejects; fails with `AnchorFailed` if the ledger stays unreachable
    /// through the bounded retry window. Nothing is stored on any failure
    /// path.
    #[instrument(skip(self, proof, public_signals), fields(user = %user_address, attestation_type = %attestation_type))]
    pub async fn verify_and_anchor(
        &self,
        proof: &str,
        public_signals: &[String],
        attestation_type: AttestationType,
        user_address: Address,
    ) -> Result<Attestation> {
        if public_signals.is_empty() {
            return Err(BrokerError::ProofInvalid(
                "public signals must not be empty".to_string(),
            ));
        }

        let valid = tokio::time::timeout(
            self.config.verifier_timeout,
            self.verifier.verify(proof, public_signals, attestation_type),
        )
        .await
        .map_err(|_| {
            BrokerError::CollaboratorUnavailable("proof verifier timed out".to_string())
        })??;
        if !valid {
            warn!("proof verification failed");
            return Err(BrokerError::ProofInvalid(
                "verifier rejected the proof".to_string(),
            ));
        }

        let commitment = compute_proof_commitment(proof, public_signals);
        let issued_at = Utc::now();
        let expires_at = issued_at + self.config.attestation_validity;
        let signature = self.issuer.sign_commitment(
            &commitment,
            user_address.as_str(),
            expires_at.timestamp(),
        );

        self.anchor_record(
            user_address,
            attestation_type,
            commitment,
            issued_at,
            expires_at,
            signature,
        )
        .await
    }

    /// Anchor an attestation from a pre-computed commitment and signature
    /// (the caller has already run verification elsewhere).
    #[instrument(skip(self, proof_commitment, signature), fields(user = %user_address))]
    pub async fn anchor_prepared(
        &self,
        user_address: Address,
        attestation_type: AttestationType,
        proof_commitment: Hash256,
        signature: String,
        expires_at: DateTime<Utc>,
    ) -> Result<Attestation> {
        let issued_at = Utc::now();
        if expires_at <= issued_at {
            return Err(BrokerError::Validation(
                "expiry must be in the future".to_string(),
            ));
        }
        self.anchor_record(
            user_address,
            attestation_type,
            proof_commitment,
            issued_at,
            expires_at,
            signature,
        )
        .await
    }

    /// All attestations for an address regardless of expiry; callers filter.
    pub async fn list_attestations(&self, address: &Address) -> Result<Vec<Attestation>> {
        self.store.list_for(address).await
    }

    async fn anchor_record(
        &self,
        user_address: Address,
        attestation_type: AttestationType,
        proof_commitment: Hash256,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        signature: String,
    ) -> Result<Attestation> {
        let record = AttestationRecord {
            user_address: user_address.clone(),
            attestation_type,
            proof_commitment,
            issued_at,
            expires_at,
            signature: signature.clone(),
        };
        let receipt = self.anchor_service.anchor(&record).await?;

        let attestation = Attestation {
            attestation_id: receipt.attestation_id,
            user_address,
            attestation_type,
            proof_commitment,
            issued_at,
            expires_at,
            signature,
            transaction_id: receipt.transaction_id,
        };
        self.store.append(attestation.clone()).await?;
        info!(
            attestation_id = attestation.attestation_id,
            "attestation recorded"
        );
        Ok(attestation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchor::AnchorConfig;
    use crate::crypto::verify_commitment_signature;
    use crate::infra::{
        InMemoryAttestationStore, MockProofVerifier, RetryConfig, StubLedgerAnchor,
        StubProofVerifier,
    };

    fn registry_with(verifier: Arc<dyn ProofVerifier>) -> AttestationRegistry {
        let anchor_service = AnchorService::new(
            Arc::new(StubLedgerAnchor::new()),
            AnchorConfig {
                call_timeout: Duration::from_millis(100),
                retry: RetryConfig::fast(),
            },
        );
        AttestationRegistry::new(
            verifier,
            anchor_service,
            Arc::new(InMemoryAttestationStore::new()),
            IssuerSigningKey::generate(),
            RegistryConfig::default(),
        )
    }

    fn addr() -> Address {
        Address::parse("0x1234567890abcdef").unwrap()
    }

    #[tokio::test]
    async fn verifies_anchors_and_lists() {
        let registry = registry_with(Arc::new(StubProofVerifier::new()));
        let attestation = registry
            .verify_and_anchor(
                "proof-bytes",
                &["signal-human".to_string()],
                AttestationType::Human,
                addr(),
            )
            .await
            .unwrap();

        assert!(attestation.expires_at > attestation.issued_at);
        assert_eq!(
            (attestation.expires_at - attestation.issued_at).num_days(),
            365
        );
        assert!(attestation.transaction_id.starts_with("tx-"));

        let listed = registry.list_attestations(&addr()).await.unwrap();
        assert_eq!(listed, vec![attestation]);
    }

    #[tokio::test]
    async fn signature_verifies_against_issuer_key() {
        let registry = registry_with(Arc::new(StubProofVerifier::new()));
        let issuer_key = registry.issuer.verifying_key();
        let attestation = registry
            .verify_and_anchor(
                "proof-bytes",
                &["signal-human".to_string()],
                AttestationType::Human,
                addr(),
            )
            .await
            .unwrap();

        verify_commitment_signature(
            &issuer_key,
            &attestation.proof_commitment,
            attestation.user_address.as_str(),
            attestation.expires_at.timestamp(),
            &attestation.signature,
        )
        .unwrap();
    }

    #[tokio::test]
    async fn empty_signals_fail_before_the_verifier_runs() {
        let mut verifier = MockProofVerifier::new();
        verifier.expect_verify().times(0);
        let registry = registry_with(Arc::new(verifier));

        let err = registry
            .verify_and_anchor("proof", &[], AttestationType::Human, addr())
            .await
            .unwrap_err();
        assert!(matches!(err, BrokerError::ProofInvalid(_)));
        assert!(registry.list_attestations(&addr()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejected_proof_stores_nothing() {
        let mut verifier = MockProofVerifier::new();
        verifier.expect_verify().returning(|_, _, _| Ok(false));
        let registry = registry_with(Arc::new(verifier));

        let err = registry
            .verify_and_anchor(
                "proof",
                &["signal".to_string()],
                AttestationType::Age18,
                addr(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BrokerError::ProofInvalid(_)));
        assert!(registry.list_attestations(&addr()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn anchor_prepared_rejects_past_expiry() {
        let registry = registry_with(Arc::new(StubProofVerifier::new()));
        let err = registry
            .anchor_prepared(
                addr(),
                AttestationType::Human,
                [0u8; 32],
                "sig".to_string(),
                Utc::now() - ChronoDuration::seconds(10),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BrokerError::Validation(_)));
    }
}
