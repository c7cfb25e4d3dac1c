//! Shared helpers for integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use delego_broker::access::AccessVerifier;
use delego_broker::broker::{AccessSessionBroker, BrokerConfig};
use delego_broker::domain::{Address, PassId};
use delego_broker::infra::{
    DelegationConfig, InMemoryDelegationStore, SeededOwnershipOracle, SingleSlotProfileAllocator,
};

pub const OWNER: &str = "0x1234567890abcdef";
pub const DELEGATE: &str = "0x9876543210fedcba";
pub const STRANGER: &str = "0x0011223344556677";

pub fn addr(s: &str) -> Address {
    Address::parse(s).unwrap()
}

/// The full in-memory service stack, with the concrete store exposed so tests
/// can seed records directly.
pub struct Stack {
    pub oracle: Arc<SeededOwnershipOracle>,
    pub store: Arc<InMemoryDelegationStore>,
    pub verifier: AccessVerifier,
    pub broker: AccessSessionBroker,
}

pub async fn stack_with_owner(owner: &str, pass_id: u64) -> Stack {
    let oracle = Arc::new(SeededOwnershipOracle::new());
    oracle.grant(addr(owner), PassId::new(pass_id)).await;
    let store = Arc::new(InMemoryDelegationStore::new(
        oracle.clone(),
        DelegationConfig::default(),
    ));
    let verifier = AccessVerifier::new(oracle.clone(), store.clone(), Duration::from_secs(5));
    let broker = AccessSessionBroker::new(
        store.clone(),
        oracle.clone(),
        Arc::new(SingleSlotProfileAllocator::new()),
        BrokerConfig::default(),
    );
    Stack {
        oracle,
        store,
        verifier,
        broker,
    }
}
