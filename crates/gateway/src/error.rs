//! Gateway error types.

use domain::OrderError;
use store::StoreError;
use thiserror::Error;

use crate::rules::FieldError;

/// Errors that can occur during gateway operations.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The selected provider does not implement this operation. Always
    /// surfaced, never silently swallowed, so callers can treat
    /// "unsupported" uniformly.
    #[error("Gateway '{gateway}' has not implemented {method}")]
    NotImplemented {
        gateway: &'static str,
        method: &'static str,
    },

    /// No gateway is registered under the given provider identifier.
    #[error("Unknown payment provider: {0}")]
    UnknownProvider(String),

    /// The order has no gateway selected.
    #[error("Order {0} has no payment provider selected")]
    NoGatewaySelected(common::OrderId),

    /// Buyer-submitted payment data failed the gateway's checkout rules.
    #[error("Checkout validation failed: {}", format_field_errors(.0))]
    Validation(Vec<FieldError>),

    /// The provider reported a capture failure (decline, network error).
    /// The order stays `Unpaid`.
    #[error("Payment capture failed: {reason}")]
    CaptureFailed { reason: String },

    /// An inbound webhook payload failed verification.
    #[error("Webhook rejected: {reason}")]
    WebhookRejected { reason: String },

    /// The webhook payload carried no usable order reference.
    #[error("Webhook payload has no order reference")]
    MissingOrderReference,

    /// A state-machine transition was rejected by the order aggregate.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// A record-store operation failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn format_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;
