//! Cart error types.

use store::StoreError;
use thiserror::Error;

/// Errors that can occur while resolving or mutating a cart.
#[derive(Debug, Error)]
pub enum CartError {
    /// A record-store operation failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// An operation was rejected by the order aggregate.
    #[error("Order error: {0}")]
    Order(#[from] domain::OrderError),
}

/// Result type for cart operations.
pub type Result<T> = std::result::Result<T, CartError>;
