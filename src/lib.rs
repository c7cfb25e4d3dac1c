//! Delego Broker Library
//!
//! Brokers time-bounded, revocable access to shared subscription passes:
//! owners delegate passes to third parties, delegates redeem ephemeral access
//! sessions against a single-occupancy profile slot, and an attestation
//! registry anchors privacy-preserving identity attestations.
//!
//! ## Modules
//!
//! - [`domain`] - Core domain types (delegations, sessions, attestations)
//! - [`infra`] - Stores, capability traits, in-memory implementations, retry
//! - [`crypto`] - Commitment hashing and issuer signing
//! - [`anchor`] - Ledger anchoring with bounded timeout and retry
//! - [`registry`] - Attestation registry
//! - [`broker`] - Access session broker
//! - [`access`] - Access verification service
//! - [`api`] - REST API routes
//! - [`server`] - HTTP server bootstrap

pub mod access;
pub mod anchor;
pub mod api;
pub mod broker;
pub mod crypto;
pub mod domain;
pub mod infra;
pub mod registry;
pub mod server;

// Re-export commonly used types
pub use domain::{
    AccessGrant, AccessSession, AccessType, Address, Attestation, AttestationType, Delegation,
    DelegationId, Hash256, PassId, ProfileAccessGrant, ProfileHandle,
};

pub use infra::{BrokerError, DelegationStore, ErrorKind, Result};
