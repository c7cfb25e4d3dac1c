//! Access Verification Service.
//!
//! Answers "does address X have access to pass Y" by combining a direct
//! ownership lookup with the active-delegation lookup. Read-only and safe to
//! call concurrently; expiry is evaluated freshly on every call.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, instrument};

use crate::domain::{AccessGrant, AccessType, Address, PassId};
use crate::infra::{BrokerError, DelegationStore, OwnershipOracle, Result};

/// Combines the ownership oracle and delegation store into a single access
/// verdict.
pub struct AccessVerifier {
    oracle: Arc<dyn OwnershipOracle>,
    delegations: Arc<dyn DelegationStore>,
    oracle_timeout: Duration,
}

impl AccessVerifier {
    pub fn new(
        oracle: Arc<dyn OwnershipOracle>,
        delegations: Arc<dyn DelegationStore>,
        oracle_timeout: Duration,
    ) -> Self {
        Self {
            oracle,
            delegations,
            oracle_timeout,
        }
    }

    /// Check how `address` is entitled to `pass_id`, if at all.
    ///
    /// Direct ownership wins regardless of delegation state; otherwise any
    /// delegation for this pass satisfying the currently-granting predicate
    /// yields `Delegated`.
    #[instrument(skip(self), fields(%address, %pass_id))]
    pub async fn check_access(&self, address: &Address, pass_id: PassId) -> Result<AccessGrant> {
        let owns_directly = tokio::time::timeout(
            self.oracle_timeout,
            self.oracle.owns_asset(address, pass_id),
        )
        .await
        .map_err(|_| {
            BrokerError::CollaboratorUnavailable("ownership oracle timed out".to_string())
        })??;

        let now = Utc::now();
        let has_active_delegation = self
            .delegations
            .list_active_for(address)
            .await?
            .iter()
            .any(|d| d.pass_id == pass_id && d.is_currently_granting(now));

        let access_type = if owns_directly {
            AccessType::Direct
        } else if has_active_delegation {
            AccessType::Delegated
        } else {
            AccessType::None
        };
        debug!(?access_type, "access check complete");

        Ok(AccessGrant {
            owns_directly,
            has_active_delegation,
            access_type,
        })
    }
}
