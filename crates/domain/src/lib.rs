//! Domain layer for the storefront commerce core.
//!
//! This crate provides the pure commercial model with no I/O:
//! - Order aggregate with line items, addresses, and an append-only status log
//! - OrderStatus/PaymentStatus state machine predicates
//! - Totals engine producing a consistent breakdown in minor currency units
//! - Coupon evaluator with constraint checks and discount pricing
//! - Product and customer entities referenced by orders

pub mod coupon;
pub mod customer;
pub mod order;
pub mod product;
pub mod totals;

pub use coupon::{Coupon, CouponConstraints, CouponError, DiscountKind};
pub use customer::Customer;
pub use order::{
    Address, CustomerId, GatewaySelection, LineItem, Money, Order, OrderError, OrderStatus,
    PaymentStatus, ProductId, StatusEntry, StatusLog,
};
pub use product::Product;
pub use totals::{TotalsBreakdown, compute};
