//! REST API handlers.

pub mod attestations;
pub mod delegations;
pub mod health;
pub mod passes;
pub mod sessions;
