//! REST API layer: router, handlers and wire types.

pub mod handlers;
pub mod rest;
pub mod types;

pub use rest::router;
