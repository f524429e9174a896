//! Shared identifier types for the storefront commerce core.

pub mod types;

pub use types::{EventId, OrderId};
