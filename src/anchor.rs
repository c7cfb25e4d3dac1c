//! Ledger anchoring with bounded timeout and retry.
//!
//! Wraps the opaque `LedgerAnchor` capability so that a slow or failing
//! ledger surfaces as a typed `AnchorFailed` after a bounded number of
//! attempts, never as an indefinitely hanging caller. Anchoring is safe to
//! retry because the attestation record is deterministic from its inputs.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument};

use crate::infra::{
    retry_with_backoff, AnchorReceipt, AttestationRecord, BrokerError, ErrorKind, LedgerAnchor,
    Result, RetryConfig,
};

/// Configuration for the anchoring boundary.
#[derive(Debug, Clone)]
pub struct AnchorConfig {
    /// Timeout applied to each individual ledger call.
    pub call_timeout: Duration,
    /// Bounded retry policy across calls.
    pub retry: RetryConfig,
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(10),
            retry: RetryConfig::anchoring(),
        }
    }
}

/// Service submitting attestation records to the ledger.
pub struct AnchorService {
    ledger: Arc<dyn LedgerAnchor>,
    config: AnchorConfig,
}

impl AnchorService {
    pub fn new(ledger: Arc<dyn LedgerAnchor>, config: AnchorConfig) -> Self {
        Self { ledger, config }
    }

    /// Anchor a record, retrying infrastructure failures with exponential
    /// backoff. Exhausted retries surface as `AnchorFailed`.
    #[instrument(skip(self, record), fields(user = %record.user_address))]
    pub async fn anchor(&self, record: &AttestationRecord) -> Result<AnchorReceipt> {
        let receipt = retry_with_backoff(&self.config.retry, "ledger_anchor", || async {
            tokio::time::timeout(self.config.call_timeout, self.ledger.anchor(record))
                .await
                .map_err(|_| {
                    BrokerError::CollaboratorUnavailable("ledger anchor timed out".to_string())
                })?
        })
        .await
        .map_err(|err| {
            if err.kind() == ErrorKind::Infrastructure {
                BrokerError::AnchorFailed(err.to_string())
            } else {
                err
            }
        })?;

        info!(
            attestation_id = receipt.attestation_id,
            transaction_id = %receipt.transaction_id,
            "attestation anchored"
        );
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use chrono::Utc;

    use super::*;
    use crate::crypto::compute_proof_commitment;
    use crate::domain::{Address, AttestationType};
    use crate::infra::MockLedgerAnchor;

    fn record() -> AttestationRecord {
        let now = Utc::now();
        AttestationRecord {
            user_address: Address::parse("0x1234567890abcdef").unwrap(),
            attestation_type: AttestationType::Human,
            proof_commitment: compute_proof_commitment("proof", &["human".to_string()]),
            issued_at: now,
            expires_at: now + chrono::Duration::days(365),
            signature: "00".repeat(64),
        }
    }

    fn test_config() -> AnchorConfig {
        AnchorConfig {
            call_timeout: Duration::from_millis(100),
            retry: RetryConfig::fast(),
        }
    }

    #[tokio::test]
    async fn returns_receipt_on_success() {
        let mut ledger = MockLedgerAnchor::new();
        ledger.expect_anchor().times(1).returning(|_| {
            Ok(AnchorReceipt {
                attestation_id: 5,
                transaction_id: "tx-abc".to_string(),
            })
        });

        let service = AnchorService::new(Arc::new(ledger), test_config());
        let receipt = service.anchor(&record()).await.unwrap();
        assert_eq!(receipt.attestation_id, 5);
    }

    #[tokio::test]
    async fn surfaces_anchor_failed_after_bounded_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let seen = calls.clone();
        let mut ledger = MockLedgerAnchor::new();
        ledger.expect_anchor().returning(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            Err(BrokerError::CollaboratorUnavailable("ledger down".into()))
        });

        let service = AnchorService::new(Arc::new(ledger), test_config());
        let err = service.anchor(&record()).await.unwrap_err();
        assert!(matches!(err, BrokerError::AnchorFailed(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn recovers_from_transient_ledger_failure() {
        let calls = Arc::new(AtomicU32::new(0));
        let seen = calls.clone();
        let mut ledger = MockLedgerAnchor::new();
        ledger.expect_anchor().returning(move |_| {
            if seen.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(BrokerError::CollaboratorUnavailable("blip".into()))
            } else {
                Ok(AnchorReceipt {
                    attestation_id: 1,
                    transaction_id: "tx-1".to_string(),
                })
            }
        });

        let service = AnchorService::new(Arc::new(ledger), test_config());
        assert!(service.anchor(&record()).await.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
