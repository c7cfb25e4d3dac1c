//! Delegation records: time-bounded authorization from an owner to a delegate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::types::{Address, DelegationId, PassId};

/// A time-bounded grant of access to a pass, from its owner to a delegate.
///
/// `is_active` flips to `false` only on explicit revocation. Expiry is never
/// written back to the record; whether a delegation is currently granting
/// access is always derived from `expires_at` against a fresh `now`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegation {
    pub delegation_id: DelegationId,
    pub pass_id: PassId,
    /// Owner of the pass at creation time.
    pub creator_address: Address,
    pub delegate_address: Address,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Cleared only by revocation, never by expiry.
    pub is_active: bool,
    /// Set when the creator revokes; retained for audit.
    pub revoked_at: Option<DateTime<Utc>>,
}

impl Delegation {
    /// Whether this delegation grants access at `now`.
    pub fn is_currently_granting(&self, now: DateTime<Utc>) -> bool {
        self.is_active && now < self.expires_at
    }

    /// Seconds of lifetime remaining at `now`, zero if expired.
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_seconds().max(0)
    }

    /// Deep link a delegate can open to start the redemption flow.
    pub fn access_url(&self) -> String {
        format!(
            "https://delego.app/access?delegation={}",
            self.delegation_id
        )
    }
}
