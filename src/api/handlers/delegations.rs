//! Delegation handlers: create, revoke, list active, verify access.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::{debug, info, instrument};

use crate::api::types::{
    error_response, validation_error, ActiveDelegationsResponse, CreateDelegationRequest,
    CreateDelegationResponse, DelegationBody, ErrorBody, RevokeDelegationRequest,
    RevokeDelegationResponse, VerifyAccessResponse,
};
use crate::domain::{AccessType, Address, DelegationId, PassId};
use crate::server::AppState;

fn parse_address(raw: &str, field: &str) -> Result<Address, (StatusCode, Json<ErrorBody>)> {
    Address::parse(raw).map_err(|_| validation_error(format!("invalid {field} address format")))
}

/// POST /api/delegation/create - Create a delegation.
#[instrument(skip(state, request), fields(pass_id = request.pass_id))]
pub async fn create_delegation(
    State(state): State<AppState>,
    Json(request): Json<CreateDelegationRequest>,
) -> Result<Json<CreateDelegationResponse>, (StatusCode, Json<ErrorBody>)> {
    if request.pass_id == 0 {
        return Err(validation_error("passId must be positive"));
    }
    let creator = parse_address(&request.creator_address, "creator")?;
    let delegate = parse_address(&request.delegate_address, "delegate")?;

    info!(
        creator = %creator,
        delegate = %delegate,
        duration = request.duration_seconds,
        "creating delegation"
    );
    let delegation = state
        .delegation_store
        .create(
            PassId::new(request.pass_id),
            creator,
            delegate,
            request.duration_seconds,
        )
        .await
        .map_err(error_response)?;

    Ok(Json(CreateDelegationResponse {
        success: true,
        delegation: DelegationBody::from(&delegation),
    }))
}

/// POST /api/delegation/revoke/:id - Revoke a delegation.
#[instrument(skip(state, request), fields(delegation_id = id))]
pub async fn revoke_delegation(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(request): Json<RevokeDelegationRequest>,
) -> Result<Json<RevokeDelegationResponse>, (StatusCode, Json<ErrorBody>)> {
    let revoker = parse_address(&request.revoker_address, "revoker")?;

    let delegation = state
        .delegation_store
        .revoke(DelegationId::new(id), &revoker)
        .await
        .map_err(error_response)?;

    Ok(Json(RevokeDelegationResponse {
        delegation_id: id,
        revoked: true,
        revoked_at: delegation
            .revoked_at
            .map(|t| t.timestamp())
            .unwrap_or_default(),
    }))
}

/// GET /api/delegation/active/:address - Active delegations for an address.
#[instrument(skip(state))]
pub async fn active_delegations(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<ActiveDelegationsResponse>, (StatusCode, Json<ErrorBody>)> {
    let address = parse_address(&address, "delegate")?;
    debug!(%address, "fetching active delegations");

    let delegations = state
        .delegation_store
        .list_active_for(&address)
        .await
        .map_err(error_response)?;

    Ok(Json(ActiveDelegationsResponse {
        address: address.to_string(),
        active_count: delegations.len(),
        delegations: delegations.iter().map(DelegationBody::from).collect(),
    }))
}

/// GET /api/delegation/verify/:address/:pass_id - Access check.
#[instrument(skip(state))]
pub async fn verify_access(
    State(state): State<AppState>,
    Path((address, pass_id)): Path<(String, u64)>,
) -> Result<Json<VerifyAccessResponse>, (StatusCode, Json<ErrorBody>)> {
    let address = parse_address(&address, "queried")?;
    if pass_id == 0 {
        return Err(validation_error("passId must be positive"));
    }

    let grant = state
        .access_verifier
        .check_access(&address, PassId::new(pass_id))
        .await
        .map_err(error_response)?;

    Ok(Json(VerifyAccessResponse {
        address: address.to_string(),
        pass_id,
        has_access: grant.has_access(),
        owns_nft: grant.owns_directly,
        has_active_delegation: grant.has_active_delegation,
        access_type: match grant.access_type {
            AccessType::Direct => "direct",
            AccessType::Delegated => "delegated",
            AccessType::None => "none",
        }
        .to_string(),
    }))
}
