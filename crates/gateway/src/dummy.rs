//! Built-in onsite test gateway.
//!
//! Captures synchronously against a fake card network: every card is
//! accepted except a known-bad number and expired cards. Useful for local
//! development and as the reference onsite implementation.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Datelike, Utc};
use common::OrderId;
use domain::Order;
use uuid::Uuid;

use crate::error::{GatewayError, Result};
use crate::processor::PaymentProcessor;
use crate::protocol::{Gateway, Receipt, RefundRecord};
use crate::rules::{CheckoutRule, FieldKind, validate};

/// The one card number the fake network declines.
const INVALID_CARD: &str = "1111 1111 1111 1111";

const MONTHS: &[&str] = &[
    "01", "02", "03", "04", "05", "06", "07", "08", "09", "10", "11", "12",
];

/// Onsite gateway backed by a fake card network.
pub struct DummyGateway {
    processor: Arc<PaymentProcessor>,
}

impl DummyGateway {
    pub fn new(processor: Arc<PaymentProcessor>) -> Self {
        Self { processor }
    }

    /// Runs the fake card network's accept/decline logic.
    fn authorize(payload: &serde_json::Value) -> std::result::Result<(), String> {
        let card = payload
            .get("card_number")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        if card == INVALID_CARD {
            return Err("The card provided is invalid.".to_string());
        }

        let year = payload
            .get("expiry_year")
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse::<i32>().ok())
            .unwrap_or_default();
        if year < Utc::now().year() {
            return Err("The card provided has expired.".to_string());
        }

        Ok(())
    }
}

#[async_trait]
impl Gateway for DummyGateway {
    fn name(&self) -> &'static str {
        "dummy"
    }

    fn checkout_rules(&self) -> Vec<CheckoutRule> {
        vec![
            CheckoutRule::required("cardholder", FieldKind::Text, "Cardholder name is required."),
            CheckoutRule::required("card_number", FieldKind::Text, "Card number is required."),
            CheckoutRule::required(
                "expiry_month",
                FieldKind::OneOf(MONTHS),
                "Expiry month must be a valid month.",
            ),
            CheckoutRule::required(
                "expiry_year",
                FieldKind::Digits { min: 4, max: 4 },
                "Expiry year must be a 4-digit year.",
            ),
            CheckoutRule::required(
                "cvc",
                FieldKind::Digits { min: 3, max: 4 },
                "CVC must be 3 or 4 digits.",
            ),
        ]
    }

    async fn checkout(&self, order_id: OrderId, payload: &serde_json::Value) -> Result<Receipt> {
        validate(&self.checkout_rules(), payload).map_err(GatewayError::Validation)?;

        if let Err(reason) = Self::authorize(payload) {
            // The buyer can retry with another card, so the order stays
            // unpaid; only the failure event is recorded.
            self.processor.report_capture_failure(order_id, &reason).await;
            return Err(GatewayError::CaptureFailed { reason });
        }

        self.processor.mark_order_as_paid(order_id, self.name()).await?;

        let order = self.processor.find_order(order_id).await?;
        Ok(Receipt {
            order_id,
            gateway: self.name().to_string(),
            payment_reference: Uuid::new_v4().to_string(),
            amount: order.totals().grand_total,
        })
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
}
