//! Core domain types for the Delego broker.

mod access;
mod attestation;
mod delegation;
mod session;
mod types;

pub use access::{AccessGrant, AccessType};
pub use attestation::{Attestation, AttestationType};
pub use delegation::Delegation;
pub use session::{
    AccessSession, ProfileAccessGrant, ProfileHandle, SessionAuthority,
};
pub use types::{hash256_hex, Address, AddressParseError, DelegationId, Hash256, PassId};
