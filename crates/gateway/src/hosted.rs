//! Offsite gateway for hosted payment pages.
//!
//! The buyer is redirected to the provider's page; capture happens on the
//! provider's side and is reported back through a webhook. Synchronous
//! checkout is deliberately left unimplemented, so callers hit the
//! uniform not-implemented signal instead of a silent no-op.

use std::sync::Arc;

use async_trait::async_trait;
use common::OrderId;
use domain::Order;
use serde_json::json;
use uuid::Uuid;

use crate::error::{GatewayError, Result};
use crate::processor::PaymentProcessor;
use crate::protocol::{Gateway, RefundRecord, WebhookAck};

/// Offsite gateway driven by redirect handshakes and webhooks.
pub struct HostedGateway {
    processor: Arc<PaymentProcessor>,

    /// Shared secret the provider echoes back in every webhook.
    webhook_token: String,

    /// Base URL of the provider's hosted payment page.
    page_url: String,
}

impl HostedGateway {
    pub fn new(
        processor: Arc<PaymentProcessor>,
        webhook_token: impl Into<String>,
        page_url: impl Into<String>,
    ) -> Self {
        Self {
            processor,
            webhook_token: webhook_token.into(),
            page_url: page_url.into(),
        }
    }

    fn order_reference(payload: &serde_json::Value) -> Result<OrderId> {
        payload
            .pointer("/metadata/order_id")
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse().ok())
            .ok_or(GatewayError::MissingOrderReference)
    }
}

#[async_trait]
impl Gateway for HostedGateway {
    fn name(&self) -> &'static str {
        "hosted"
    }

    fn is_offsite(&self) -> bool {
        true
    }

    async fn prepare(&self, order: &Order) -> Result<serde_json::Value> {
        Ok(json!({
            "redirect": true,
            "checkout_url": format!("{}?order={}", self.page_url, order.id()),
            "amount": order.totals().grand_total.cents(),
        }))
    }

    async fn refund(&self, order: &Order) -> Result<RefundRecord> {
        let amount = order.refundable_balance();
        self.processor.refund(order.id(), amount, self.name()).await?;

        Ok(RefundRecord {
            order_id: order.id(),
            gateway: self.name().to_string(),
            refund_reference: Uuid::new_v4().to_string(),
            amount,
        })
    }

    /// Handles a capture notification from the provider.
    ///
    /// Safe under redelivery: a repeated `payment.captured` for an
    /// already-paid order acknowledges without re-running side effects.
    async fn webhook(&self, payload: &serde_json::Value) -> Result<WebhookAck> {
        let token = payload.get("token").and_then(|v| v.as_str());
        if token != Some(self.webhook_token.as_str()) {
            return Err(GatewayError::WebhookRejected {
                reason: "invalid webhook token".to_string(),
            });
        }

        let order_id = Self::order_reference(payload)?;
        let kind = payload.get("type").and_then(|v| v.as_str()).unwrap_or_default();

        match kind {
            "payment.captured" => {
                self.processor.mark_order_as_paid(order_id, self.name()).await?;
            }
            "payment.failed" => {
                let reason = payload
                    .get("reason")
                    .and_then(|v| v.as_str())
                    .unwrap_or("payment failed");
                self.processor.mark_order_as_failed(order_id, reason).await?;
            }
            other => {
                return Err(GatewayError::WebhookRejected {
                    reason: format!("unsupported notification type: {other}"),
                });
            }
        }

        Ok(WebhookAck {
            order_id,
            body: "ok".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{Money, PaymentStatus, Product};
    use store::{InMemoryCoupons, InMemoryOrders, InMemoryProducts, OrderRepository, ProductRepository};

    use crate::events::InMemoryEventSink;
    use crate::processor::RefundPolicy;

    struct Fixture {
        orders: Arc<InMemoryOrders>,
        products: Arc<InMemoryProducts>,
        gateway: HostedGateway,
    }

    async fn fixture() -> (Fixture, OrderId) {
        let orders = Arc::new(InMemoryOrders::new());
        let products = Arc::new(InMemoryProducts::new());
        let processor = Arc::new(PaymentProcessor::new(
            orders.clone(),
            products.clone(),
            Arc::new(InMemoryCoupons::new()),
            Arc::new(InMemoryEventSink::new()),
            RefundPolicy::default(),
        ));

        products
            .save(&Product::new("SKU-001", "Widget", Money::from_cents(1500), 10))
            .await
            .unwrap();

        let mut order = Order::new();
        order
            .add_line_item("SKU-001", 1, Money::from_cents(1500))
            .unwrap();
        orders.save(&mut order).await.unwrap();
        let order_id = order.id();

        let gateway = HostedGateway::new(processor, "s3cret", "https://pay.example.com/session");
        (
            Fixture {
                orders,
                products,
                gateway,
            },
            order_id,
        )
    }

    fn captured_payload(order_id: OrderId) -> serde_json::Value {
        json!({
            "token": "s3cret",
            "type": "payment.captured",
            "metadata": { "order_id": order_id.to_string() },
        })
    }

    #[tokio::test]
    async fn test_prepare_returns_redirect_handshake() {
        let (fx, order_id) = fixture().await;
        let order = fx.orders.find(order_id).await.unwrap();

        let handshake = fx.gateway.prepare(&order).await.unwrap();
        assert_eq!(handshake["redirect"], json!(true));
        let url = handshake["checkout_url"].as_str().unwrap();
        assert!(url.contains(&order_id.to_string()));
    }

    #[tokio::test]
    async fn test_checkout_is_not_a_capture_path() {
        let (fx, order_id) = fixture().await;

        assert!(matches!(
            fx.gateway.checkout(order_id, &json!({})).await,
            Err(GatewayError::NotImplemented { gateway: "hosted", method: "checkout" })
        ));
    }

    #[tokio::test]
    async fn test_captured_webhook_marks_order_paid() {
        let (fx, order_id) = fixture().await;

        let ack = fx.gateway.webhook(&captured_payload(order_id)).await.unwrap();
        assert_eq!(ack.order_id, order_id);

        let order = fx.orders.find(order_id).await.unwrap();
        assert_eq!(order.payment_status(), PaymentStatus::Paid);
        assert_eq!(fx.products.stock(&"SKU-001".into()).await.unwrap(), 9);
    }

    #[tokio::test]
    async fn test_webhook_redelivery_is_acknowledged_without_side_effects() {
        let (fx, order_id) = fixture().await;

        fx.gateway.webhook(&captured_payload(order_id)).await.unwrap();
        fx.gateway.webhook(&captured_payload(order_id)).await.unwrap();

        let order = fx.orders.find(order_id).await.unwrap();
        assert_eq!(order.status_log().count("paid"), 1);
        assert_eq!(fx.products.stock(&"SKU-001".into()).await.unwrap(), 9);
    }

    #[tokio::test]
    async fn test_failed_webhook_transitions_to_failed() {
        let (fx, order_id) = fixture().await;

        let payload = json!({
            "token": "s3cret",
            "type": "payment.failed",
            "reason": "insufficient funds",
            "metadata": { "order_id": order_id.to_string() },
        });
        fx.gateway.webhook(&payload).await.unwrap();

        let order = fx.orders.find(order_id).await.unwrap();
        assert_eq!(order.payment_status(), PaymentStatus::Failed);
    }

    #[tokio::test]
    async fn test_webhook_rejects_bad_token() {
        let (fx, order_id) = fixture().await;

        let mut payload = captured_payload(order_id);
        payload["token"] = json!("wrong");

        assert!(matches!(
            fx.gateway.webhook(&payload).await,
            Err(GatewayError::WebhookRejected { .. })
        ));
    }

    #[tokio::test]
    async fn test_webhook_requires_order_reference() {
        let (fx, _) = fixture().await;

        let payload = json!({ "token": "s3cret", "type": "payment.captured" });
        assert!(matches!(
            fx.gateway.webhook(&payload).await,
            Err(GatewayError::MissingOrderReference)
        ));
    }
}
