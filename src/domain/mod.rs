//! Framework-agnostic domain types.

pub mod order;

pub use order::{Order, OrderStatus};
