//! Derived access-grant query results.

use serde::{Deserialize, Serialize};

/// How an address is entitled to a pass, if at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessType {
    /// Direct ownership of the pass.
    Direct,
    /// Access via an active delegation.
    Delegated,
    /// No entitlement.
    None,
}

/// Result of an access check. Derived on every call, never stored: expiry is
/// evaluated against a fresh `now` because time advances independent of any
/// mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessGrant {
    pub owns_directly: bool,
    pub has_active_delegation: bool,
    pub access_type: AccessType,
}

impl AccessGrant {
    pub fn has_access(&self) -> bool {
        !matches!(self.access_type, AccessType::None)
    }
}
