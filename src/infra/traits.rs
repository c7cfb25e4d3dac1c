//! Trait definitions for the Delego broker's stores and external
//! collaborators.
//!
//! Every blockchain/proof dependency is modeled as a named capability passed
//! in at construction, so tests can substitute deterministic implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
#[cfg(test)]
use mockall::automock;

use crate::domain::{
    Address, Attestation, AttestationType, Delegation, DelegationId, Hash256, PassId,
    ProfileHandle,
};

use super::Result;

/// External capability answering "does address X own pass Y".
///
/// Must be invoked with a bounded timeout; a hung oracle surfaces as
/// `CollaboratorUnavailable`, never as an indefinitely blocked caller.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait OwnershipOracle: Send + Sync {
    async fn owns_asset(&self, address: &Address, pass_id: PassId) -> Result<bool>;
}

/// External capability validating a zero-knowledge proof.
///
/// The broker never inspects proof internals; it only consumes the boolean
/// verdict and commits to the inputs by hash.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ProofVerifier: Send + Sync {
    async fn verify(
        &self,
        proof: &str,
        public_signals: &[String],
        attestation_type: AttestationType,
    ) -> Result<bool>;
}

/// Content of an attestation prior to anchoring. Deterministic from its
/// inputs, which is what makes the anchoring call safely retryable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestationRecord {
    pub user_address: Address,
    pub attestation_type: AttestationType,
    pub proof_commitment: Hash256,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Issuer signature over the commitment, hex-encoded.
    pub signature: String,
}

/// Receipt returned by the ledger after anchoring an attestation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorReceipt {
    pub attestation_id: u64,
    pub transaction_id: String,
}

/// Opaque transaction-execution service standing in for the ledger.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait LedgerAnchor: Send + Sync {
    /// Submit an attestation record for anchoring.
    async fn anchor(&self, record: &AttestationRecord) -> Result<AnchorReceipt>;
}

/// External capability managing occupancy of the shared resource slot backing
/// a pass.
///
/// For a single-occupancy resource, `acquire` for a pass whose only slot is
/// held must fail with `ResourceBusy`; two concurrent acquisitions must never
/// both succeed.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ProfileAllocator: Send + Sync {
    /// Acquire the profile slot for `pass_id` on behalf of `grantee`.
    async fn acquire(&self, pass_id: PassId, grantee: &Address) -> Result<ProfileHandle>;

    /// Release a previously acquired slot. Idempotent.
    async fn release(&self, pass_id: PassId, profile_id: &str) -> Result<()>;
}

/// Store of delegation grants.
///
/// Creation and revocation for a given delegation are serialized; reads after
/// a write in the same process observe the write. Records are never physically
/// deleted (retained for audit).
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DelegationStore: Send + Sync {
    /// Create a delegation after verifying ownership and duration bounds.
    /// Atomic: either the full record becomes visible or none of it.
    async fn create(
        &self,
        pass_id: PassId,
        creator_address: Address,
        delegate_address: Address,
        duration_seconds: i64,
    ) -> Result<Delegation>;

    /// Revoke a delegation. Creator-only; a second revoke surfaces
    /// `AlreadyRevoked`.
    async fn revoke(
        &self,
        delegation_id: DelegationId,
        requester_address: &Address,
    ) -> Result<Delegation>;

    /// Delegations where `delegate_address == address` and the
    /// currently-granting predicate holds, evaluated at read time.
    async fn list_active_for(&self, address: &Address) -> Result<Vec<Delegation>>;

    async fn get_by_id(&self, delegation_id: DelegationId) -> Result<Delegation>;
}

/// Store of anchored attestations, keyed by user address.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AttestationStore: Send + Sync {
    /// Append an anchored attestation. Records are immutable once stored.
    async fn append(&self, attestation: Attestation) -> Result<()>;

    /// All attestations for an address regardless of expiry; callers filter.
    async fn list_for(&self, address: &Address) -> Result<Vec<Attestation>>;
}
