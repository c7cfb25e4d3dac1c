//! Access sessions: ephemeral, opaque tokens brokering use of a shared
//! resource without exposing owner credentials.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::types::{Address, DelegationId, PassId};

/// How the grantee was authorized when the session was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionAuthority {
    /// Issued against an active delegation.
    Delegated,
    /// Issued to the pass owner directly.
    Direct,
}

/// An opaque handle to the brokered resource slot (e.g. a profile on the
/// underlying streaming account). Carries a display name only, never
/// credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileHandle {
    pub profile_id: String,
    pub display_name: String,
}

/// A live access session. Two effective states: live (`now < expires_at`) and
/// terminal (revoked or swept); there is no stored distinction between a
/// freshly issued and an already-redeemed session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessSession {
    /// Cryptographically random, unguessable identifier.
    pub session_id: String,
    /// Authorizing delegation, absent for direct-ownership sessions.
    pub delegation_id: Option<DelegationId>,
    pub authority: SessionAuthority,
    pub pass_id: PassId,
    pub grantee_address: Address,
    pub profile_handle: ProfileHandle,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl AccessSession {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// What a grantee receives on successful redemption. References the profile
/// by display name only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileAccessGrant {
    pub profile_handle: ProfileHandle,
    pub expires_at: DateTime<Utc>,
    pub instructions: Vec<String>,
    pub login_url: String,
}

impl ProfileAccessGrant {
    /// Build the delegate-facing grant for a session.
    pub fn for_session(session: &AccessSession, base_url: &str) -> Self {
        let profile = session.profile_handle.clone();
        Self {
            instructions: vec![
                "Open the login link below".to_string(),
                format!("Select the \"{}\" profile", profile.display_name),
                format!(
                    "Access expires at {}",
                    session.expires_at.format("%Y-%m-%d %H:%M:%S UTC")
                ),
            ],
            login_url: format!("{base_url}/access?session={}", session.session_id),
            expires_at: session.expires_at,
            profile_handle: profile,
        }
    }
}
