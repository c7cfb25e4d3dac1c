//! REST API endpoints for the Delego broker.

use axum::routing::{get, post};
use axum::Router;

use crate::api::handlers::{attestations, delegations, health, passes, sessions};
use crate::server::AppState;

/// Build the `/api` router.
pub fn router() -> Router<AppState> {
    Router::new()
        // Delegations
        .route("/delegation/create", post(delegations::create_delegation))
        .route("/delegation/revoke/:id", post(delegations::revoke_delegation))
        .route("/delegation/active/:address", get(delegations::active_delegations))
        .route(
            "/delegation/verify/:address/:pass_id",
            get(delegations::verify_access),
        )
        // Access sessions
        .route("/session/issue", post(sessions::issue_session))
        .route("/session/redeem/:session_id", post(sessions::redeem_session))
        .route("/session/revoke/:session_id", post(sessions::revoke_session))
        // Attestations
        .route("/zk/verify", post(attestations::verify_attestation))
        .route("/zk/anchor", post(attestations::anchor_attestation))
        .route("/zk/attestations/:address", get(attestations::list_attestations))
        // Demo ownership seeding
        .route("/pass/grant", post(passes::grant_pass))
        // Health
        .route("/health", get(health::health))
}
