//! Demo pass-ownership registration.
//!
//! The demo oracle is an explicit grant table; this endpoint seeds it so a
//! deployment can register owners without an on-chain mint flow.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;
use tracing::{info, instrument};

use crate::api::types::{validation_error, ErrorBody, GrantPassRequest};
use crate::domain::{Address, PassId};
use crate::server::AppState;

/// POST /api/pass/grant - Record that an address owns a pass.
#[instrument(skip(state, request), fields(pass_id = request.pass_id))]
pub async fn grant_pass(
    State(state): State<AppState>,
    Json(request): Json<GrantPassRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorBody>)> {
    if request.pass_id == 0 {
        return Err(validation_error("passId must be positive"));
    }
    let owner = Address::parse(&request.owner_address)
        .map_err(|_| validation_error("invalid owner address format"))?;

    state
        .ownership_oracle
        .grant(owner.clone(), PassId::new(request.pass_id))
        .await;
    info!(%owner, "pass ownership registered");

    Ok(Json(json!({
        "success": true,
        "ownerAddress": owner.to_string(),
        "passId": request.pass_id,
    })))
}
