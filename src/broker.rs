//! Access Session Broker.
//!
//! Converts a delegation (authorization) into a scoped, opaque, single-purpose
//! access session that lets a delegate use the shared resource without ever
//! learning the owner's credentials. Sessions are bounded by their authorizing
//! delegation, single-occupancy per pass, and lazily swept after expiry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rand::RngCore;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::domain::{
    AccessSession, Address, DelegationId, PassId, ProfileAccessGrant, SessionAuthority,
};
use crate::infra::{
    BrokerError, DelegationStore, OwnershipOracle, ProfileAllocator, Result,
};

/// Configuration for session issuance.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// Floor on the effective session duration (default 5 minutes).
    pub min_session_secs: i64,
    /// Cap on any session duration (default 30 days).
    pub max_session_secs: i64,
    /// Timeout applied to collaborator calls (allocator, oracle).
    pub collaborator_timeout: Duration,
    /// Base URL for delegate-facing login links.
    pub access_base_url: String,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            min_session_secs: 300,
            max_session_secs: 2_592_000,
            collaborator_timeout: Duration::from_secs(5),
            access_base_url: "https://delego.app".to_string(),
        }
    }
}

/// Issues, redeems, revokes and sweeps access sessions.
///
/// The session table sits behind one mutex held across the occupancy check
/// and allocation, so two concurrent issuances against the same pass
/// serialize: one succeeds, the other observes `ResourceBusy`.
pub struct AccessSessionBroker {
    delegations: Arc<dyn DelegationStore>,
    oracle: Arc<dyn OwnershipOracle>,
    allocator: Arc<dyn ProfileAllocator>,
    sessions: Mutex<HashMap<String, AccessSession>>,
    config: BrokerConfig,
}

impl AccessSessionBroker {
    pub fn new(
        delegations: Arc<dyn DelegationStore>,
        oracle: Arc<dyn OwnershipOracle>,
        allocator: Arc<dyn ProfileAllocator>,
        config: BrokerConfig,
    ) -> Self {
        Self {
            delegations,
            oracle,
            allocator,
            sessions: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Issue a session against an active delegation.
    ///
    /// The effective duration is the requested duration clamped by the
    /// delegation's remaining lifetime and the session cap; a session can
    /// never outlive its authorizing delegation.
    #[instrument(skip(self), fields(%delegation_id, requester = %requester_address))]
    pub async fn issue_session(
        &self,
        delegation_id: DelegationId,
        requester_address: &Address,
        requested_duration_secs: i64,
    ) -> Result<AccessSession> {
        let delegation = self.delegations.get_by_id(delegation_id).await?;
        if &delegation.delegate_address != requester_address {
            return Err(BrokerError::Unauthorized(
                "requester is not the delegate of this delegation".to_string(),
            ));
        }

        let now = Utc::now();
        if !delegation.is_currently_granting(now) {
            return Err(BrokerError::DelegationExpired(delegation_id));
        }

        let effective_secs = requested_duration_secs
            .min(delegation.remaining_seconds(now))
            .min(self.config.max_session_secs);
        self.issue(
            delegation.pass_id,
            requester_address.clone(),
            Some(delegation_id),
            SessionAuthority::Delegated,
            effective_secs,
            now,
        )
        .await
    }

    /// Issue a session to the pass owner directly, without a delegation.
    #[instrument(skip(self), fields(%pass_id, owner = %owner_address))]
    pub async fn issue_owner_session(
        &self,
        pass_id: PassId,
        owner_address: &Address,
        requested_duration_secs: i64,
    ) -> Result<AccessSession> {
        let owns = tokio::time::timeout(
            self.config.collaborator_timeout,
            self.oracle.owns_asset(owner_address, pass_id),
        )
        .await
        .map_err(|_| {
            BrokerError::CollaboratorUnavailable("ownership oracle timed out".to_string())
        })??;
        if !owns {
            return Err(BrokerError::NotOwner(pass_id));
        }

        let effective_secs = requested_duration_secs.min(self.config.max_session_secs);
        self.issue(
            pass_id,
            owner_address.clone(),
            None,
            SessionAuthority::Direct,
            effective_secs,
            Utc::now(),
        )
        .await
    }

    async fn issue(
        &self,
        pass_id: PassId,
        grantee_address: Address,
        delegation_id: Option<DelegationId>,
        authority: SessionAuthority,
        effective_secs: i64,
        now: DateTime<Utc>,
    ) -> Result<AccessSession> {
        if effective_secs < self.config.min_session_secs {
            return Err(BrokerError::DurationTooShort {
                effective: effective_secs,
                min: self.config.min_session_secs,
            });
        }

        let mut sessions = self.sessions.lock().await;
        // Opportunistic sweep so an already-expired session never causes a
        // ResourceBusy rejection.
        self.sweep_locked(&mut sessions, now).await;

        let profile_handle = tokio::time::timeout(
            self.config.collaborator_timeout,
            self.allocator.acquire(pass_id, &grantee_address),
        )
        .await
        .map_err(|_| {
            BrokerError::CollaboratorUnavailable("profile allocator timed out".to_string())
        })??;

        let session = AccessSession {
            session_id: generate_session_id(),
            delegation_id,
            authority,
            pass_id,
            grantee_address,
            profile_handle,
            issued_at: now,
            expires_at: now + ChronoDuration::seconds(effective_secs),
        };
        sessions.insert(session.session_id.clone(), session.clone());
        info!(
            session_id = %session.session_id,
            %pass_id,
            expires_at = %session.expires_at,
            "session issued"
        );
        Ok(session)
    }

    /// Redeem a session for its profile-access grant.
    ///
    /// Idempotent before expiry: redeeming twice returns the same grant. On
    /// the expiry path the session is eagerly swept, so the next redemption
    /// observes `SessionNotFound`.
    #[instrument(skip(self, session_id), fields(presenter = %presenting_address))]
    pub async fn redeem_session(
        &self,
        session_id: &str,
        presenting_address: &Address,
    ) -> Result<ProfileAccessGrant> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .get(session_id)
            .ok_or(BrokerError::SessionNotFound)?;

        if &session.grantee_address != presenting_address {
            return Err(BrokerError::Unauthorized(
                "presenting address does not match session grantee".to_string(),
            ));
        }

        let now = Utc::now();
        if !session.is_live(now) {
            // Release before removing: if the release fails the record stays,
            // so the slot is retried instead of leaked.
            self.allocator
                .release(session.pass_id, &session.profile_handle.profile_id)
                .await?;
            sessions.remove(session_id);
            debug!(%session_id, "expired session swept on redemption");
            return Err(BrokerError::SessionExpired);
        }

        Ok(ProfileAccessGrant::for_session(
            session,
            &self.config.access_base_url,
        ))
    }

    /// Delegate-facing instructions for a session, without touching stored
    /// state.
    pub fn grant_for(&self, session: &AccessSession) -> ProfileAccessGrant {
        ProfileAccessGrant::for_session(session, &self.config.access_base_url)
    }

    /// Revoke a session, freeing its profile handle. Idempotent. The record
    /// is removed only once the release succeeds; a failed release surfaces
    /// the error and leaves the session revocable again.
    #[instrument(skip(self, session_id))]
    pub async fn revoke_session(&self, session_id: &str) -> Result<()> {
        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.get(session_id) {
            self.allocator
                .release(session.pass_id, &session.profile_handle.profile_id)
                .await?;
            sessions.remove(session_id);
            info!(%session_id, "session revoked");
        }
        Ok(())
    }

    /// Sweep all expired sessions, freeing handles and deleting records.
    /// Returns the number of sessions swept. Runs periodically and inline
    /// before allocation attempts.
    pub async fn sweep_expired(&self) -> Result<usize> {
        let mut sessions = self.sessions.lock().await;
        let swept = self.sweep_locked(&mut sessions, Utc::now()).await;
        if swept > 0 {
            info!(swept, "swept expired sessions");
        }
        Ok(swept)
    }

    /// Number of live sessions; expired-but-unswept records are excluded.
    pub async fn live_session_count(&self) -> usize {
        let now = Utc::now();
        let sessions = self.sessions.lock().await;
        sessions.values().filter(|s| s.is_live(now)).count()
    }

    async fn sweep_locked(
        &self,
        sessions: &mut HashMap<String, AccessSession>,
        now: DateTime<Utc>,
    ) -> usize {
        let expired: Vec<String> = sessions
            .iter()
            .filter(|(_, s)| !s.is_live(now))
            .map(|(id, _)| id.clone())
            .collect();
        let mut swept = 0;
        for id in expired {
            if let Some(session) = sessions.get(&id) {
                // Release before removing: a failed release keeps the record,
                // so the next sweep retries it instead of leaking the slot.
                match self
                    .allocator
                    .release(session.pass_id, &session.profile_handle.profile_id)
                    .await
                {
                    Ok(()) => {
                        sessions.remove(&id);
                        swept += 1;
                    }
                    Err(err) => {
                        warn!(session_id = %id, error = %err, "profile release failed; retrying next sweep");
                    }
                }
            }
        }
        swept
    }
}

/// 32 random bytes, hex-encoded: unguessable by construction.
fn generate_session_id() -> String {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
