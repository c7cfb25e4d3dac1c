//! Error types for the Delego broker.

use thiserror::Error;

use crate::domain::{DelegationId, PassId};

/// Errors that can occur across the broker's components.
#[derive(Error, Debug)]
pub enum BrokerError {
    /// Malformed input, caller's fault, never retried
    #[error("validation error: {0}")]
    Validation(String),

    /// Creator does not own the pass it tries to delegate
    #[error("address does not own pass {0}")]
    NotOwner(PassId),

    /// Only the delegation creator may revoke it
    #[error("requester is not the creator of delegation {0}")]
    NotCreator(DelegationId),

    /// Presenting address does not match the grantee/delegate
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Delegation absent from the store
    #[error("delegation not found: {0}")]
    DelegationNotFound(DelegationId),

    /// Session absent from the store (including already-swept sessions)
    #[error("session not found")]
    SessionNotFound,

    /// Grant duration outside the allowed bounds
    #[error("duration {requested}s out of range [{min}s, {max}s]")]
    DurationOutOfRange {
        requested: i64,
        min: i64,
        max: i64,
    },

    /// Effective session duration below the floor
    #[error("effective session duration {effective}s below minimum {min}s")]
    DurationTooShort { effective: i64, min: i64 },

    /// An owner cannot delegate to itself
    #[error("self-delegation is forbidden")]
    SelfDelegationForbidden,

    /// Revocation of an already-revoked delegation
    #[error("delegation {0} is already revoked")]
    AlreadyRevoked(DelegationId),

    /// Delegation revoked or past expiry
    #[error("delegation {0} is expired or revoked")]
    DelegationExpired(DelegationId),

    /// Single-occupancy resource already held by a live session
    #[error("resource for pass {0} is busy")]
    ResourceBusy(PassId),

    /// Session past expiry
    #[error("session expired")]
    SessionExpired,

    /// Proof failed verification
    #[error("proof verification failed: {0}")]
    ProofInvalid(String),

    /// Ledger anchoring failed after bounded retries
    #[error("ledger anchoring failed: {0}")]
    AnchorFailed(String),

    /// External collaborator timed out or errored
    #[error("collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

/// Coarse classification used for HTTP status mapping and retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Authorization,
    NotFound,
    StateConflict,
    Infrastructure,
}

impl BrokerError {
    /// Classify per the error taxonomy: validation and authorization errors
    /// are synchronous and side-effect free, state conflicts leave no partial
    /// state, and only infrastructure errors are retry-eligible (at the
    /// anchoring boundary).
    pub fn kind(&self) -> ErrorKind {
        match self {
            BrokerError::Validation(_)
            | BrokerError::DurationOutOfRange { .. }
            | BrokerError::DurationTooShort { .. }
            | BrokerError::SelfDelegationForbidden
            | BrokerError::ProofInvalid(_) => ErrorKind::Validation,
            BrokerError::NotOwner(_)
            | BrokerError::NotCreator(_)
            | BrokerError::Unauthorized(_) => ErrorKind::Authorization,
            BrokerError::DelegationNotFound(_) | BrokerError::SessionNotFound => {
                ErrorKind::NotFound
            }
            BrokerError::AlreadyRevoked(_)
            | BrokerError::DelegationExpired(_)
            | BrokerError::ResourceBusy(_)
            | BrokerError::SessionExpired => ErrorKind::StateConflict,
            BrokerError::AnchorFailed(_)
            | BrokerError::CollaboratorUnavailable(_)
            | BrokerError::Internal(_) => ErrorKind::Infrastructure,
        }
    }

    /// Stable machine-readable kind string carried in error bodies.
    pub fn kind_str(&self) -> &'static str {
        match self {
            BrokerError::Validation(_) => "validation",
            BrokerError::NotOwner(_) => "not_owner",
            BrokerError::NotCreator(_) => "not_creator",
            BrokerError::Unauthorized(_) => "unauthorized",
            BrokerError::DelegationNotFound(_) => "delegation_not_found",
            BrokerError::SessionNotFound => "session_not_found",
            BrokerError::DurationOutOfRange { .. } => "duration_out_of_range",
            BrokerError::DurationTooShort { .. } => "duration_too_short",
            BrokerError::SelfDelegationForbidden => "self_delegation_forbidden",
            BrokerError::AlreadyRevoked(_) => "already_revoked",
            BrokerError::DelegationExpired(_) => "delegation_expired",
            BrokerError::ResourceBusy(_) => "resource_busy",
            BrokerError::SessionExpired => "session_expired",
            BrokerError::ProofInvalid(_) => "proof_invalid",
            BrokerError::AnchorFailed(_) => "anchor_failed",
            BrokerError::CollaboratorUnavailable(_) => "collaborator_unavailable",
            BrokerError::Internal(_) => "internal",
        }
    }
}

/// Result type for broker operations
pub type Result<T> = std::result::Result<T, BrokerError>;
