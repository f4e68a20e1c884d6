//! Ports the checkout core depends on.

pub mod order_store;

pub use order_store::{OrderStore, RepositoryError, RepositoryResult};
