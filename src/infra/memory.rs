//! In-memory store and collaborator implementations.
//!
//! These back the demo deployment and the test suites. Each store is a
//! key-value table behind a `tokio::sync` lock with exclusive-write /
//! shared-read discipline; contention scope is per-delegation and per-pass,
//! matching the ordering guarantees the traits promise.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{
    Address, Attestation, AttestationType, Delegation, DelegationId, PassId, ProfileHandle,
};

use super::error::{BrokerError, Result};
use super::traits::{
    AnchorReceipt, AttestationRecord, AttestationStore, DelegationStore, LedgerAnchor,
    OwnershipOracle, ProfileAllocator, ProofVerifier,
};

/// Bounds and timeouts governing delegation creation.
#[derive(Debug, Clone)]
pub struct DelegationConfig {
    /// Minimum grant duration in seconds (default 1 hour).
    pub min_duration_secs: i64,
    /// Maximum grant duration in seconds (default 30 days).
    pub max_duration_secs: i64,
    /// Timeout applied to each ownership-oracle call.
    pub oracle_timeout: Duration,
}

impl Default for DelegationConfig {
    fn default() -> Self {
        Self {
            min_duration_secs: 3_600,
            max_duration_secs: 2_592_000,
            oracle_timeout: Duration::from_secs(5),
        }
    }
}

/// In-memory delegation store keyed by delegation id.
///
/// Creation and revocation take the write lock, so mutations for a given
/// delegation are serialized and a racing read never observes a torn record.
pub struct InMemoryDelegationStore {
    delegations: RwLock<HashMap<DelegationId, Delegation>>,
    next_id: AtomicU64,
    oracle: std::sync::Arc<dyn OwnershipOracle>,
    config: DelegationConfig,
}

impl InMemoryDelegationStore {
    pub fn new(oracle: std::sync::Arc<dyn OwnershipOracle>, config: DelegationConfig) -> Self {
        Self {
            delegations: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            oracle,
            config,
        }
    }

    /// Insert a pre-built record, bypassing ownership and duration checks.
    /// Used for seeding demo data and for tests that need expired records.
    pub async fn insert(&self, delegation: Delegation) {
        let mut delegations = self.delegations.write().await;
        let id = delegation.delegation_id;
        delegations.insert(id, delegation);
        // keep the id allocator ahead of seeded records
        self.next_id.fetch_max(id.as_u64() + 1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DelegationStore for InMemoryDelegationStore {
    async fn create(
        &self,
        pass_id: PassId,
        creator_address: Address,
        delegate_address: Address,
        duration_seconds: i64,
    ) -> Result<Delegation> {
        if creator_address == delegate_address {
            return Err(BrokerError::SelfDelegationForbidden);
        }
        if duration_seconds < self.config.min_duration_secs
            || duration_seconds > self.config.max_duration_secs
        {
            return Err(BrokerError::DurationOutOfRange {
                requested: duration_seconds,
                min: self.config.min_duration_secs,
                max: self.config.max_duration_secs,
            });
        }

        let owns = tokio::time::timeout(
            self.config.oracle_timeout,
            self.oracle.owns_asset(&creator_address, pass_id),
        )
        .await
        .map_err(|_| {
            BrokerError::CollaboratorUnavailable("ownership oracle timed out".to_string())
        })??;
        if !owns {
            return Err(BrokerError::NotOwner(pass_id));
        }

        let now = Utc::now();
        let delegation = Delegation {
            delegation_id: DelegationId::new(self.next_id.fetch_add(1, Ordering::SeqCst)),
            pass_id,
            creator_address,
            delegate_address,
            created_at: now,
            expires_at: now + ChronoDuration::seconds(duration_seconds),
            is_active: true,
            revoked_at: None,
        };

        // Single insert under the write lock: the full record becomes visible
        // atomically.
        let mut delegations = self.delegations.write().await;
        delegations.insert(delegation.delegation_id, delegation.clone());
        info!(
            delegation_id = %delegation.delegation_id,
            pass_id = %pass_id,
            delegate = %delegation.delegate_address,
            expires_at = %delegation.expires_at,
            "delegation created"
        );
        Ok(delegation)
    }

    async fn revoke(
        &self,
        delegation_id: DelegationId,
        requester_address: &Address,
    ) -> Result<Delegation> {
        let mut delegations = self.delegations.write().await;
        let delegation = delegations
            .get_mut(&delegation_id)
            .ok_or(BrokerError::DelegationNotFound(delegation_id))?;

        if &delegation.creator_address != requester_address {
            return Err(BrokerError::NotCreator(delegation_id));
        }
        if !delegation.is_active {
            warn!(%delegation_id, "revoke of already-revoked delegation");
            return Err(BrokerError::AlreadyRevoked(delegation_id));
        }

        delegation.is_active = false;
        delegation.revoked_at = Some(Utc::now());
        info!(%delegation_id, requester = %requester_address, "delegation revoked");
        Ok(delegation.clone())
    }

    async fn list_active_for(&self, address: &Address) -> Result<Vec<Delegation>> {
        // "active" is computed at read time; the stored flag alone is never
        // trusted for expiry.
        let now = Utc::now();
        let delegations = self.delegations.read().await;
        let mut active: Vec<Delegation> = delegations
            .values()
            .filter(|d| &d.delegate_address == address && d.is_currently_granting(now))
            .cloned()
            .collect();
        active.sort_by_key(|d| d.delegation_id);
        Ok(active)
    }

    async fn get_by_id(&self, delegation_id: DelegationId) -> Result<Delegation> {
        let delegations = self.delegations.read().await;
        delegations
            .get(&delegation_id)
            .cloned()
            .ok_or(BrokerError::DelegationNotFound(delegation_id))
    }
}

/// In-memory attestation store keyed by user address.
#[derive(Default)]
pub struct InMemoryAttestationStore {
    attestations: RwLock<HashMap<Address, Vec<Attestation>>>,
}

impl InMemoryAttestationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AttestationStore for InMemoryAttestationStore {
    async fn append(&self, attestation: Attestation) -> Result<()> {
        let mut attestations = self.attestations.write().await;
        attestations
            .entry(attestation.user_address.clone())
            .or_default()
            .push(attestation);
        Ok(())
    }

    async fn list_for(&self, address: &Address) -> Result<Vec<Attestation>> {
        let attestations = self.attestations.read().await;
        Ok(attestations.get(address).cloned().unwrap_or_default())
    }
}

/// Ownership oracle backed by an explicit grant table: seedable,
/// deterministic ownership for demos and tests.
#[derive(Default)]
pub struct SeededOwnershipOracle {
    owned: RwLock<HashMap<Address, HashSet<PassId>>>,
}

impl SeededOwnershipOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `address` owns `pass_id`.
    pub async fn grant(&self, address: Address, pass_id: PassId) {
        let mut owned = self.owned.write().await;
        owned.entry(address).or_default().insert(pass_id);
    }

    /// Remove an ownership record, e.g. after a transfer.
    pub async fn release(&self, address: &Address, pass_id: PassId) {
        let mut owned = self.owned.write().await;
        if let Some(passes) = owned.get_mut(address) {
            passes.remove(&pass_id);
        }
    }
}

#[async_trait]
impl OwnershipOracle for SeededOwnershipOracle {
    async fn owns_asset(&self, address: &Address, pass_id: PassId) -> Result<bool> {
        let owned = self.owned.read().await;
        Ok(owned
            .get(address)
            .map(|passes| passes.contains(&pass_id))
            .unwrap_or(false))
    }
}

/// Deterministic stand-in for the ZK verifier.
///
/// Verifies iff the public signals carry the marker matching the claimed
/// attestation type. Empty signal lists never verify.
#[derive(Default)]
pub struct StubProofVerifier;

impl StubProofVerifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProofVerifier for StubProofVerifier {
    async fn verify(
        &self,
        proof: &str,
        public_signals: &[String],
        attestation_type: AttestationType,
    ) -> Result<bool> {
        if proof.is_empty() || public_signals.is_empty() {
            return Ok(false);
        }
        let marker = match attestation_type {
            AttestationType::Human => "human",
            AttestationType::Age18 => "18",
        };
        Ok(public_signals.iter().any(|signal| signal.contains(marker)))
    }
}

/// Ledger stand-in that assigns sequential attestation ids and synthetic
/// transaction ids.
#[derive(Default)]
pub struct StubLedgerAnchor {
    next_attestation_id: AtomicU64,
}

impl StubLedgerAnchor {
    pub fn new() -> Self {
        Self {
            next_attestation_id: AtomicU64::new(1),
        }
    }
}

#[async_trait]
impl LedgerAnchor for StubLedgerAnchor {
    async fn anchor(&self, record: &AttestationRecord) -> Result<AnchorReceipt> {
        let attestation_id = self.next_attestation_id.fetch_add(1, Ordering::SeqCst);
        info!(
            attestation_id,
            user = %record.user_address,
            attestation_type = %record.attestation_type,
            "anchored attestation"
        );
        Ok(AnchorReceipt {
            attestation_id,
            transaction_id: format!("tx-{}", Uuid::new_v4()),
        })
    }
}

/// Single-occupancy profile allocator: one guest slot per pass.
///
/// The occupancy table sits behind one mutex, so two concurrent acquisitions
/// for the same pass serialize and exactly one succeeds.
#[derive(Default)]
pub struct SingleSlotProfileAllocator {
    occupancy: Mutex<HashMap<PassId, String>>,
}

impl SingleSlotProfileAllocator {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileAllocator for SingleSlotProfileAllocator {
    async fn acquire(&self, pass_id: PassId, grantee: &Address) -> Result<ProfileHandle> {
        let mut occupancy = self.occupancy.lock().await;
        if occupancy.contains_key(&pass_id) {
            return Err(BrokerError::ResourceBusy(pass_id));
        }
        let handle = ProfileHandle {
            profile_id: format!("profile-{}", Uuid::new_v4()),
            display_name: format!("Guest_{}", grantee.short_suffix()),
        };
        occupancy.insert(pass_id, handle.profile_id.clone());
        Ok(handle)
    }

    async fn release(&self, pass_id: PassId, profile_id: &str) -> Result<()> {
        let mut occupancy = self.occupancy.lock().await;
        // Only the current holder's release clears the slot; stale releases
        // are no-ops.
        if occupancy.get(&pass_id).map(String::as_str) == Some(profile_id) {
            occupancy.remove(&pass_id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn addr(s: &str) -> Address {
        Address::parse(s).unwrap()
    }

    async fn store_with_owner(owner: &Address, pass: PassId) -> InMemoryDelegationStore {
        let oracle = Arc::new(SeededOwnershipOracle::new());
        oracle.grant(owner.clone(), pass).await;
        InMemoryDelegationStore::new(oracle, DelegationConfig::default())
    }

    #[tokio::test]
    async fn create_assigns_monotonic_ids_and_exact_expiry() {
        let owner = addr("0x1234567890abcdef");
        let delegate = addr("0x9876543210fedcba");
        let store = store_with_owner(&owner, PassId::new(1)).await;

        let first = store
            .create(PassId::new(1), owner.clone(), delegate.clone(), 86_400)
            .await
            .unwrap();
        let second = store
            .create(PassId::new(1), owner.clone(), delegate.clone(), 86_400)
            .await
            .unwrap();

        assert!(second.delegation_id > first.delegation_id);
        assert_eq!(
            (first.expires_at - first.created_at).num_seconds(),
            86_400
        );
        assert!(first.is_active);
    }

    #[tokio::test]
    async fn create_rejects_out_of_range_durations_without_persisting() {
        let owner = addr("0x1234567890abcdef");
        let delegate = addr("0x9876543210fedcba");
        let store = store_with_owner(&owner, PassId::new(1)).await;

        for duration in [0, 3_599, 2_592_001, -5] {
            let err = store
                .create(PassId::new(1), owner.clone(), delegate.clone(), duration)
                .await
                .unwrap_err();
            assert!(matches!(err, BrokerError::DurationOutOfRange { .. }));
        }
        assert!(store.list_active_for(&delegate).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_rejects_non_owner_and_self_delegation() {
        let owner = addr("0x1234567890abcdef");
        let delegate = addr("0x9876543210fedcba");
        let store = store_with_owner(&owner, PassId::new(1)).await;

        let err = store
            .create(PassId::new(2), owner.clone(), delegate.clone(), 3_600)
            .await
            .unwrap_err();
        assert!(matches!(err, BrokerError::NotOwner(p) if p == PassId::new(2)));

        let err = store
            .create(PassId::new(1), owner.clone(), owner.clone(), 3_600)
            .await
            .unwrap_err();
        assert!(matches!(err, BrokerError::SelfDelegationForbidden));
    }

    #[tokio::test]
    async fn revoke_is_creator_only_and_detects_double_revoke() {
        let owner = addr("0x1234567890abcdef");
        let delegate = addr("0x9876543210fedcba");
        let store = store_with_owner(&owner, PassId::new(1)).await;
        let delegation = store
            .create(PassId::new(1), owner.clone(), delegate.clone(), 3_600)
            .await
            .unwrap();

        let err = store
            .revoke(delegation.delegation_id, &delegate)
            .await
            .unwrap_err();
        assert!(matches!(err, BrokerError::NotCreator(_)));

        let revoked = store
            .revoke(delegation.delegation_id, &owner)
            .await
            .unwrap();
        assert!(!revoked.is_active);
        assert!(revoked.revoked_at.is_some());

        let err = store
            .revoke(delegation.delegation_id, &owner)
            .await
            .unwrap_err();
        assert!(matches!(err, BrokerError::AlreadyRevoked(_)));
    }

    #[tokio::test]
    async fn list_active_excludes_revoked_and_expired() {
        let owner = addr("0x1234567890abcdef");
        let delegate = addr("0x9876543210fedcba");
        let store = store_with_owner(&owner, PassId::new(1)).await;

        let live = store
            .create(PassId::new(1), owner.clone(), delegate.clone(), 3_600)
            .await
            .unwrap();
        let revoked = store
            .create(PassId::new(1), owner.clone(), delegate.clone(), 3_600)
            .await
            .unwrap();
        store.revoke(revoked.delegation_id, &owner).await.unwrap();

        // Seed an expired-but-still-flagged-active record directly.
        let now = Utc::now();
        store
            .insert(Delegation {
                delegation_id: DelegationId::new(999),
                pass_id: PassId::new(1),
                creator_address: owner.clone(),
                delegate_address: delegate.clone(),
                created_at: now - ChronoDuration::hours(25),
                expires_at: now - ChronoDuration::hours(1),
                is_active: true,
                revoked_at: None,
            })
            .await;

        let active = store.list_active_for(&delegate).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].delegation_id, live.delegation_id);
    }

    #[tokio::test]
    async fn allocator_enforces_single_occupancy() {
        let allocator = SingleSlotProfileAllocator::new();
        let grantee = addr("0x9876543210fedcba");
        let pass = PassId::new(7);

        let handle = allocator.acquire(pass, &grantee).await.unwrap();
        assert_eq!(handle.display_name, "Guest_fedcba");

        let err = allocator.acquire(pass, &grantee).await.unwrap_err();
        assert!(matches!(err, BrokerError::ResourceBusy(p) if p == pass));

        // Stale release does not free the slot held by someone else.
        allocator.release(pass, "profile-other").await.unwrap();
        assert!(allocator.acquire(pass, &grantee).await.is_err());

        allocator.release(pass, &handle.profile_id).await.unwrap();
        assert!(allocator.acquire(pass, &grantee).await.is_ok());
    }

    #[tokio::test]
    async fn stub_verifier_matches_signal_markers() {
        let verifier = StubProofVerifier::new();
        let ok = verifier
            .verify("proof", &["signal-human".into()], AttestationType::Human)
            .await
            .unwrap();
        assert!(ok);

        let mismatch = verifier
            .verify("proof", &["signal-human".into()], AttestationType::Age18)
            .await
            .unwrap();
        assert!(!mismatch);

        let empty = verifier
            .verify("proof", &[], AttestationType::Human)
            .await
            .unwrap();
        assert!(!empty);
    }
}
