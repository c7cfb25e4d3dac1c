//! Infrastructure layer for the Delego broker.
//!
//! Contains trait definitions for stores and external collaborators, the
//! in-memory implementations backing the demo deployment, retry utilities,
//! and the shared error type.

mod error;
mod memory;
mod retry;
mod traits;

pub use error::{BrokerError, ErrorKind, Result};
pub use memory::{
    DelegationConfig, InMemoryAttestationStore, InMemoryDelegationStore, SeededOwnershipOracle,
    SingleSlotProfileAllocator, StubLedgerAnchor, StubProofVerifier,
};
pub use retry::{retry_with_backoff, RetryConfig};
pub use traits::{
    AnchorReceipt, AttestationRecord, AttestationStore, DelegationStore, LedgerAnchor,
    OwnershipOracle, ProfileAllocator, ProofVerifier,
};

#[cfg(test)]
pub use traits::{
    MockAttestationStore, MockDelegationStore, MockLedgerAnchor, MockOwnershipOracle,
    MockProfileAllocator, MockProofVerifier,
};
