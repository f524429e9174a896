use common::OrderId;
use domain::ProductId;
use thiserror::Error;

/// Errors that can occur when interacting with the record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The order was not found. Callers decide whether this is fatal or a
    /// cue to create a fresh cart.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The product was not found.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// The customer was not found.
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    /// The coupon code was not found.
    #[error("Coupon not found: {0}")]
    CouponNotFound(String),

    /// A concurrent writer saved the order first. The expected version did
    /// not match the stored version.
    #[error("Version conflict for order {order_id}: expected {expected}, found {actual}")]
    VersionConflict {
        order_id: OrderId,
        expected: u64,
        actual: u64,
    },

    /// A stock adjustment would drive the count below zero.
    #[error("Insufficient stock for {product_id}: {available} available, {requested} requested")]
    InsufficientStock {
        product_id: ProductId,
        available: i64,
        requested: i64,
    },

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for record-store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
