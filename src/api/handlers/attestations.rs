//! Attestation handlers: verify, anchor, list.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::api::types::{
    error_response, validation_error, AnchorAttestationRequest, AttestationBody, ErrorBody,
    VerifyProofRequest,
};
use crate::domain::{Address, AttestationType, Hash256};
use crate::infra::BrokerError;
use crate::server::AppState;

fn parse_attestation_type(raw: &str) -> Result<AttestationType, (StatusCode, Json<ErrorBody>)> {
    raw.parse()
        .map_err(|_| validation_error("attestationType must be 'human' or 'age18'"))
}

/// POST /api/zk/verify - Verify a proof and anchor the attestation.
///
/// A rejected proof returns 400 with `valid: false` rather than the generic
/// error body, so clients can distinguish "bad proof" from "bad request".
#[instrument(skip(state, request), fields(user = %request.user_address, attestation_type = %request.attestation_type))]
pub async fn verify_attestation(
    State(state): State<AppState>,
    Json(request): Json<VerifyProofRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    let reject = |details: String| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "valid": false, "error": details })),
        )
    };

    let user_address = Address::parse(&request.user_address)
        .map_err(|_| reject("invalid user address format".to_string()))?;
    let attestation_type = request
        .attestation_type
        .parse::<AttestationType>()
        .map_err(|_| reject("attestationType must be 'human' or 'age18'".to_string()))?;

    match state
        .attestation_registry
        .verify_and_anchor(
            &request.proof,
            &request.public_signals,
            attestation_type,
            user_address,
        )
        .await
    {
        Ok(attestation) => {
            info!(attestation_id = attestation.attestation_id, "proof verified");
            Ok(Json(json!({
                "valid": true,
                "attestation": AttestationBody::from(&attestation),
            })))
        }
        Err(BrokerError::ProofInvalid(details)) => {
            warn!("proof rejected");
            Err(reject(details))
        }
        Err(other) => {
            let (status, body) = error_response(other);
            Err((status, Json(serde_json::to_value(body.0).unwrap_or_default())))
        }
    }
}

/// POST /api/zk/anchor - Anchor a pre-verified attestation.
#[instrument(skip(state, request), fields(user = %request.user_address))]
pub async fn anchor_attestation(
    State(state): State<AppState>,
    Json(request): Json<AnchorAttestationRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorBody>)> {
    let user_address = Address::parse(&request.user_address)
        .map_err(|_| validation_error("invalid user address format"))?;
    let attestation_type = parse_attestation_type(&request.attestation_type)?;
    let proof_hash: Hash256 = hex::decode(&request.proof_hash)
        .ok()
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or_else(|| validation_error("proofHash must be 32 hex-encoded bytes"))?;
    let expires_at = DateTime::<Utc>::from_timestamp(request.expiry, 0)
        .ok_or_else(|| validation_error("expiry is out of range"))?;

    let attestation = state
        .attestation_registry
        .anchor_prepared(
            user_address,
            attestation_type,
            proof_hash,
            request.signature,
            expires_at,
        )
        .await
        .map_err(error_response)?;

    Ok(Json(json!({
        "success": true,
        "attestationId": attestation.attestation_id,
        "transactionId": attestation.transaction_id,
        "anchored": true,
    })))
}

/// GET /api/zk/attestations/:address - All attestations for an address.
#[instrument(skip(state))]
pub async fn list_attestations(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorBody>)> {
    let address = Address::parse(&address)
        .map_err(|_| validation_error("invalid address format"))?;

    let attestations = state
        .attestation_registry
        .list_attestations(&address)
        .await
        .map_err(error_response)?;

    Ok(Json(json!({
        "userAddress": address.to_string(),
        "attestations": attestations.iter().map(AttestationBody::from).collect::<Vec<_>>(),
        "count": attestations.len(),
    })))
}
