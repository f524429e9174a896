//! Order aggregate and related types.

mod aggregate;
mod status;
mod status_log;
mod value_objects;

pub use aggregate::Order;
pub use status::{OrderStatus, PaymentStatus};
pub use status_log::{StatusEntry, StatusLog};
pub use value_objects::{Address, CustomerId, GatewaySelection, LineItem, Money, ProductId};

use thiserror::Error;

use crate::coupon::CouponError;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Invalid quantity.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },

    /// Line item not found in order.
    #[error("Line item not found: {product_id}")]
    ItemNotFound { product_id: String },

    /// The order's commercial status does not allow the action.
    #[error("Invalid status transition: cannot {action} from {status} status")]
    InvalidStatusTransition {
        status: OrderStatus,
        action: &'static str,
    },

    /// The order's payment status does not allow the transition.
    #[error("Invalid payment transition: cannot {action} from {status} payment status")]
    InvalidPaymentTransition {
        status: PaymentStatus,
        action: &'static str,
    },

    /// The refund would push the refunded total past the captured amount.
    #[error("Refund of {amount} exceeds the refundable balance of {remaining}")]
    RefundExceedsBalance { amount: Money, remaining: Money },

    /// The coupon was rejected during application.
    #[error(transparent)]
    Coupon(#[from] CouponError),
}
