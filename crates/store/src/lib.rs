//! Record-store abstraction for the storefront commerce core.
//!
//! Persistent storage is an external collaborator: this crate defines the
//! repository traits the core depends on and provides in-memory
//! implementations used by tests and the default server wiring.

pub mod error;
pub mod memory;
pub mod repository;

pub use error::{Result, StoreError};
pub use memory::{InMemoryCoupons, InMemoryCustomers, InMemoryOrders, InMemoryProducts};
pub use repository::{CouponRepository, CustomerRepository, OrderRepository, ProductRepository};
