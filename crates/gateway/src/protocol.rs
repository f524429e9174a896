//! The gateway contract every payment provider implements.

use async_trait::async_trait;
use common::OrderId;
use domain::{Money, Order};
use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, Result};
use crate::rules::CheckoutRule;

/// Proof of a successful synchronous capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub order_id: OrderId,
    pub gateway: String,

    /// Provider-side reference for the captured payment.
    pub payment_reference: String,

    /// Amount captured, in minor units.
    pub amount: Money,
}

/// Record of a refund issued through a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefundRecord {
    pub order_id: OrderId,
    pub gateway: String,

    /// Provider-side reference for the refund.
    pub refund_reference: String,

    /// Amount refunded, in minor units.
    pub amount: Money,
}

/// Acknowledgement returned to the provider after a webhook delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookAck {
    pub order_id: OrderId,

    /// Body echoed back to the provider.
    pub body: String,
}

/// A payment-provider integration.
///
/// Every operation a provider does not support must signal
/// [`GatewayError::NotImplemented`] rather than being silently omitted;
/// the default method bodies do exactly that, so implementations only
/// override what their provider actually offers.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Stable provider identifier, also used as the registry key.
    fn name(&self) -> &'static str;

    /// True when capture happens asynchronously via [`Gateway::webhook`]
    /// instead of synchronously via [`Gateway::checkout`].
    fn is_offsite(&self) -> bool {
        false
    }

    /// Declarative constraints on the buyer-submitted checkout payload.
    fn checkout_rules(&self) -> Vec<CheckoutRule> {
        Vec::new()
    }

    /// Prepares a client-side handshake for the order before the buyer
    /// submits payment details (e.g. a payment intent or redirect URL).
    async fn prepare(&self, order: &Order) -> Result<serde_json::Value> {
        let _ = order;
        Err(GatewayError::NotImplemented {
            gateway: self.name(),
            method: "prepare",
        })
    }

    /// Captures payment synchronously with buyer-submitted data.
    ///
    /// Implementations must validate `payload` against
    /// [`Gateway::checkout_rules`], call the payment processor's
    /// `mark_order_as_paid` on success, and reject on provider failure —
    /// never silently succeed. Offsite gateways keep the default body:
    /// checkout is not a valid capture path for them.
    async fn checkout(&self, order_id: OrderId, payload: &serde_json::Value) -> Result<Receipt> {
        let _ = (order_id, payload);
        Err(GatewayError::NotImplemented {
            gateway: self.name(),
            method: "checkout",
        })
    }

    /// Refunds the order's captured payment through the provider and
    /// drives the refund transition with the refunded amount.
    async fn refund(&self, order: &Order) -> Result<RefundRecord> {
        let _ = order;
        Err(GatewayError::NotImplemented {
            gateway: self.name(),
            method: "refund",
        })
    }

    /// Handles a provider-initiated notification.
    ///
    /// Implementations must verify the payload against the provider's
    /// signing contract, extract the embedded order reference, and invoke
    /// the appropriate state-machine transition. Must be safe to invoke
    /// multiple times with the same payload.
    async fn webhook(&self, payload: &serde_json::Value) -> Result<WebhookAck> {
        let _ = payload;
        Err(GatewayError::NotImplemented {
            gateway: self.name(),
            method: "webhook",
        })
    }
}
