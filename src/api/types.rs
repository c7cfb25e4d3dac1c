//! Shared request and response types for REST API handlers.
//!
//! Wire format is camelCase JSON with unix-second timestamps. Every error
//! body carries `{error, details?}`.

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::domain::{AccessSession, Attestation, Delegation};
use crate::infra::{BrokerError, ErrorKind};

// ============================================================================
// Delegation types
// ============================================================================

/// Request body for delegation creation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDelegationRequest {
    pub pass_id: u64,
    pub delegate_address: String,
    pub duration_seconds: i64,
    pub creator_address: String,
}

/// Request body for delegation revocation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokeDelegationRequest {
    pub revoker_address: String,
}

/// Wire representation of a delegation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegationBody {
    pub id: u64,
    pub pass_id: u64,
    pub creator_address: String,
    pub delegate_address: String,
    pub created_at: i64,
    pub expires_at: i64,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revoked_at: Option<i64>,
    pub access_url: String,
}

impl From<&Delegation> for DelegationBody {
    fn from(d: &Delegation) -> Self {
        Self {
            id: d.delegation_id.as_u64(),
            pass_id: d.pass_id.as_u64(),
            creator_address: d.creator_address.to_string(),
            delegate_address: d.delegate_address.to_string(),
            created_at: d.created_at.timestamp(),
            expires_at: d.expires_at.timestamp(),
            is_active: d.is_active,
            revoked_at: d.revoked_at.map(|t| t.timestamp()),
            access_url: d.access_url(),
        }
    }
}

/// Response for delegation creation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDelegationResponse {
    pub success: bool,
    pub delegation: DelegationBody,
}

/// Response for delegation revocation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokeDelegationResponse {
    pub delegation_id: u64,
    pub revoked: bool,
    pub revoked_at: i64,
}

/// Response listing active delegations for an address.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveDelegationsResponse {
    pub address: String,
    pub delegations: Vec<DelegationBody>,
    pub active_count: usize,
}

/// Response for an access verification query.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyAccessResponse {
    pub address: String,
    pub pass_id: u64,
    pub has_access: bool,
    #[serde(rename = "ownsNFT")]
    pub owns_nft: bool,
    pub has_active_delegation: bool,
    pub access_type: String,
}

// ============================================================================
// Session types
// ============================================================================

/// Request body for session issuance. Either `delegation_id` (delegate flow)
/// or `pass_id` (owner flow) must be present.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueSessionRequest {
    pub delegation_id: Option<u64>,
    pub pass_id: Option<u64>,
    pub requester_address: String,
    pub requested_duration_seconds: i64,
}

/// Request body for session redemption.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemSessionRequest {
    pub presenting_address: String,
}

/// Wire representation of an issued session.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionBody {
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delegation_id: Option<u64>,
    pub pass_id: u64,
    pub grantee_address: String,
    pub profile_name: String,
    pub issued_at: i64,
    pub expires_at: i64,
}

impl From<&AccessSession> for SessionBody {
    fn from(s: &AccessSession) -> Self {
        Self {
            session_id: s.session_id.clone(),
            delegation_id: s.delegation_id.map(|id| id.as_u64()),
            pass_id: s.pass_id.as_u64(),
            grantee_address: s.grantee_address.to_string(),
            profile_name: s.profile_handle.display_name.clone(),
            issued_at: s.issued_at.timestamp(),
            expires_at: s.expires_at.timestamp(),
        }
    }
}

// ============================================================================
// Attestation types
// ============================================================================

/// Request body for proof verification.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyProofRequest {
    pub proof: String,
    pub public_signals: Vec<String>,
    pub attestation_type: String,
    pub user_address: String,
}

/// Request body for anchoring a pre-verified attestation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorAttestationRequest {
    pub user_address: String,
    /// Hex-encoded 32-byte commitment.
    pub proof_hash: String,
    pub signature: String,
    pub attestation_type: String,
    /// Unix seconds; must be in the future.
    pub expiry: i64,
}

/// Wire representation of an attestation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttestationBody {
    pub attestation_id: u64,
    pub user_address: String,
    pub attestation_type: String,
    pub proof_hash: String,
    pub issued_at: i64,
    pub expires_at: i64,
    pub signature: String,
    pub transaction_id: String,
}

impl From<&Attestation> for AttestationBody {
    fn from(a: &Attestation) -> Self {
        Self {
            attestation_id: a.attestation_id,
            user_address: a.user_address.to_string(),
            attestation_type: a.attestation_type.as_str().to_string(),
            proof_hash: hex::encode(a.proof_commitment),
            issued_at: a.issued_at.timestamp(),
            expires_at: a.expires_at.timestamp(),
            signature: a.signature.clone(),
            transaction_id: a.transaction_id.clone(),
        }
    }
}

/// Request body for registering pass ownership with the demo oracle.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantPassRequest {
    pub owner_address: String,
    pub pass_id: u64,
}

// ============================================================================
// Error mapping
// ============================================================================

/// Structured error body: stable kind plus a human-readable message, never
/// exception internals.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Map a broker error to its HTTP status and body.
pub fn error_response(err: BrokerError) -> (StatusCode, Json<ErrorBody>) {
    let status = match err.kind() {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Authorization => StatusCode::FORBIDDEN,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::StateConflict => StatusCode::CONFLICT,
        ErrorKind::Infrastructure => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorBody {
            error: err.kind_str().to_string(),
            details: Some(err.to_string()),
        }),
    )
}

/// Shorthand for a 400 with a stable `validation` kind.
pub fn validation_error(details: impl Into<String>) -> (StatusCode, Json<ErrorBody>) {
    error_response(BrokerError::Validation(details.into()))
}
