//! Order and payment state machines.

use serde::{Deserialize, Serialize};

/// The commercial status of an order.
///
/// Transitions:
/// ```text
/// Cart ──► Placed ──► Completed
/// ```
///
/// There is no transition back to `Cart` once an order has been placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order is still a cart, items can be added/removed.
    #[default]
    Cart,

    /// Checkout was submitted successfully.
    Placed,

    /// Order has been fulfilled (terminal state).
    Completed,
}

impl OrderStatus {
    /// Returns true if items, coupons, and addresses can be modified.
    pub fn can_modify(&self) -> bool {
        matches!(self, OrderStatus::Cart)
    }

    /// Returns true if the order can move to `Placed`.
    pub fn can_place(&self) -> bool {
        matches!(self, OrderStatus::Cart)
    }

    /// Returns true if the order can move to `Completed`.
    pub fn can_complete(&self) -> bool {
        matches!(self, OrderStatus::Placed)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Cart => "cart",
            OrderStatus::Placed => "placed",
            OrderStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The payment status of an order, orthogonal to [`OrderStatus`].
///
/// Transitions:
/// ```text
/// Unpaid ──┬──► Paid ──┬──► PartiallyRefunded ──► Refunded
///          │           └──► Refunded
///          └──► Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// No capture has happened yet.
    #[default]
    Unpaid,

    /// Payment was captured in full.
    Paid,

    /// Part of the captured amount has been refunded.
    PartiallyRefunded,

    /// The full captured amount has been refunded (terminal state).
    Refunded,

    /// A capture attempt was reported as failed by the provider.
    Failed,
}

impl PaymentStatus {
    /// Returns true if the order can be marked as paid from this status.
    pub fn can_mark_paid(&self) -> bool {
        matches!(self, PaymentStatus::Unpaid)
    }

    /// Returns true if a refund can be issued from this status.
    pub fn can_refund(&self) -> bool {
        matches!(self, PaymentStatus::Paid | PaymentStatus::PartiallyRefunded)
    }

    /// Returns true if a capture failure can be recorded from this status.
    pub fn can_mark_failed(&self) -> bool {
        matches!(self, PaymentStatus::Unpaid)
    }

    /// Returns true if money has been captured and not fully returned.
    pub fn is_settled(&self) -> bool {
        matches!(self, PaymentStatus::Paid | PaymentStatus::PartiallyRefunded)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Paid => "paid",
            PaymentStatus::PartiallyRefunded => "partially_refunded",
            PaymentStatus::Refunded => "refunded",
            PaymentStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
