//! Integration tests for the delegation lifecycle and access verification.
//!
//! Covers the full owner-to-delegate flow: creation against the ownership
//! oracle, read-time expiry classification, revocation, and the combined
//! access verdict.

mod common;

use chrono::{Duration as ChronoDuration, Utc};

use delego_broker::domain::{AccessType, Delegation, DelegationId, PassId};
use delego_broker::infra::{BrokerError, DelegationStore};

use common::*;

#[tokio::test]
async fn created_delegation_matches_requested_duration_exactly() {
    let stack = stack_with_owner(OWNER, 1).await;
    let delegation = stack
        .store
        .create(PassId::new(1), addr(OWNER), addr(DELEGATE), 86_400)
        .await
        .unwrap();

    assert_eq!(
        (delegation.expires_at - delegation.created_at).num_seconds(),
        86_400
    );
    assert!(delegation.is_active);
    assert_eq!(
        delegation.access_url(),
        format!(
            "https://delego.app/access?delegation={}",
            delegation.delegation_id
        )
    );
}

#[tokio::test]
async fn delegate_sees_delegated_access_then_none_after_expiry_window() {
    let stack = stack_with_owner(OWNER, 1).await;
    let now = Utc::now();

    // A day-long delegation created at t0, observed one hour in.
    stack
        .store
        .insert(Delegation {
            delegation_id: DelegationId::new(1),
            pass_id: PassId::new(1),
            creator_address: addr(OWNER),
            delegate_address: addr(DELEGATE),
            created_at: now - ChronoDuration::hours(1),
            expires_at: now + ChronoDuration::hours(23),
            is_active: true,
            revoked_at: None,
        })
        .await;

    let at_one_hour = stack
        .verifier
        .check_access(&addr(DELEGATE), PassId::new(1))
        .await
        .unwrap();
    assert_eq!(at_one_hour.access_type, AccessType::Delegated);
    assert!(at_one_hour.has_access());

    // The same delegation observed 25 hours after creation.
    stack
        .store
        .insert(Delegation {
            delegation_id: DelegationId::new(1),
            pass_id: PassId::new(1),
            creator_address: addr(OWNER),
            delegate_address: addr(DELEGATE),
            created_at: now - ChronoDuration::hours(25),
            expires_at: now - ChronoDuration::hours(1),
            is_active: true,
            revoked_at: None,
        })
        .await;

    let at_25_hours = stack
        .verifier
        .check_access(&addr(DELEGATE), PassId::new(1))
        .await
        .unwrap();
    assert_eq!(at_25_hours.access_type, AccessType::None);
    assert!(!at_25_hours.has_access());
}

#[tokio::test]
async fn revoke_then_revoke_again_is_distinguishable() {
    let stack = stack_with_owner(OWNER, 1).await;
    let delegation = stack
        .store
        .create(PassId::new(1), addr(OWNER), addr(DELEGATE), 3_600)
        .await
        .unwrap();

    let revoked = stack
        .store
        .revoke(delegation.delegation_id, &addr(OWNER))
        .await
        .unwrap();
    assert!(!revoked.is_active);

    let second = stack
        .store
        .revoke(delegation.delegation_id, &addr(OWNER))
        .await
        .unwrap_err();
    assert!(matches!(second, BrokerError::AlreadyRevoked(_)));

    // Still exactly one record, still inactive.
    let fetched = stack
        .store
        .get_by_id(delegation.delegation_id)
        .await
        .unwrap();
    assert!(!fetched.is_active);
    assert!(fetched.revoked_at.is_some());
}

#[tokio::test]
async fn revocation_never_reactivates() {
    let stack = stack_with_owner(OWNER, 1).await;
    let delegation = stack
        .store
        .create(PassId::new(1), addr(OWNER), addr(DELEGATE), 86_400)
        .await
        .unwrap();
    stack
        .store
        .revoke(delegation.delegation_id, &addr(OWNER))
        .await
        .unwrap();

    // No API mutates is_active back; listing and verification agree.
    assert!(stack
        .store
        .list_active_for(&addr(DELEGATE))
        .await
        .unwrap()
        .is_empty());
    let grant = stack
        .verifier
        .check_access(&addr(DELEGATE), PassId::new(1))
        .await
        .unwrap();
    assert_eq!(grant.access_type, AccessType::None);
}

#[tokio::test]
async fn owner_keeps_direct_access_with_and_without_delegations() {
    let stack = stack_with_owner(OWNER, 1).await;

    let before = stack
        .verifier
        .check_access(&addr(OWNER), PassId::new(1))
        .await
        .unwrap();
    assert_eq!(before.access_type, AccessType::Direct);

    stack
        .store
        .create(PassId::new(1), addr(OWNER), addr(DELEGATE), 3_600)
        .await
        .unwrap();

    let after = stack
        .verifier
        .check_access(&addr(OWNER), PassId::new(1))
        .await
        .unwrap();
    assert_eq!(after.access_type, AccessType::Direct);
    assert!(after.owns_directly);
}

#[tokio::test]
async fn stranger_has_no_access() {
    let stack = stack_with_owner(OWNER, 1).await;
    stack
        .store
        .create(PassId::new(1), addr(OWNER), addr(DELEGATE), 3_600)
        .await
        .unwrap();

    let grant = stack
        .verifier
        .check_access(&addr(STRANGER), PassId::new(1))
        .await
        .unwrap();
    assert_eq!(grant.access_type, AccessType::None);
    assert!(!grant.owns_directly);
    assert!(!grant.has_active_delegation);
}

#[tokio::test]
async fn unknown_delegation_lookup_is_not_found() {
    let stack = stack_with_owner(OWNER, 1).await;
    let err = stack
        .store
        .get_by_id(DelegationId::new(424242))
        .await
        .unwrap_err();
    assert!(matches!(err, BrokerError::DelegationNotFound(_)));
}
