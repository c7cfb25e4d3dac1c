//! Session handlers: issue, redeem, revoke.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;
use tracing::{info, instrument};

use crate::api::types::{
    error_response, validation_error, ErrorBody, IssueSessionRequest, RedeemSessionRequest,
    SessionBody,
};
use crate::domain::{Address, DelegationId, PassId};
use crate::server::AppState;

/// POST /api/session/issue - Issue an access session.
///
/// Delegates pass `delegationId`; owners pass `passId` instead.
#[instrument(skip(state, request))]
pub async fn issue_session(
    State(state): State<AppState>,
    Json(request): Json<IssueSessionRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorBody>)> {
    let requester = Address::parse(&request.requester_address)
        .map_err(|_| validation_error("invalid requester address format"))?;

    let session = match (request.delegation_id, request.pass_id) {
        (Some(delegation_id), _) => state
            .session_broker
            .issue_session(
                DelegationId::new(delegation_id),
                &requester,
                request.requested_duration_seconds,
            )
            .await
            .map_err(error_response)?,
        (None, Some(pass_id)) => {
            if pass_id == 0 {
                return Err(validation_error("passId must be positive"));
            }
            state
                .session_broker
                .issue_owner_session(
                    PassId::new(pass_id),
                    &requester,
                    request.requested_duration_seconds,
                )
                .await
                .map_err(error_response)?
        }
        (None, None) => {
            return Err(validation_error(
                "either delegationId or passId is required",
            ))
        }
    };

    info!(session_id = %session.session_id, "session issued via api");
    let grant = state.session_broker.grant_for(&session);

    Ok(Json(json!({
        "success": true,
        "session": SessionBody::from(&session),
        "access": grant,
    })))
}

/// POST /api/session/redeem/:session_id - Redeem a session for its grant.
#[instrument(skip(state, session_id, request))]
pub async fn redeem_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<RedeemSessionRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorBody>)> {
    let presenter = Address::parse(&request.presenting_address)
        .map_err(|_| validation_error("invalid presenting address format"))?;

    let grant = state
        .session_broker
        .redeem_session(&session_id, &presenter)
        .await
        .map_err(error_response)?;

    Ok(Json(json!({
        "success": true,
        "access": grant,
    })))
}

/// POST /api/session/revoke/:session_id - Revoke a session. Idempotent.
#[instrument(skip(state, session_id))]
pub async fn revoke_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorBody>)> {
    state
        .session_broker
        .revoke_session(&session_id)
        .await
        .map_err(error_response)?;

    Ok(Json(json!({
        "success": true,
        "revoked": true,
    })))
}
