//! Order aggregate implementation.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use common::OrderId;
use serde::{Deserialize, Serialize};

use crate::coupon::Coupon;
use crate::totals::{self, TotalsBreakdown};

use super::{
    Address, CustomerId, GatewaySelection, LineItem, Money, OrderError, OrderStatus, PaymentStatus,
    ProductId, StatusLog,
};

/// Order aggregate root. An order in `Cart` status is the visitor's cart;
/// the same aggregate carries through placement, payment, and refunds.
///
/// Invariant: totals are always derivable from the line items, the applied
/// coupon, and the resolved shipping/tax quotes. Every mutating operation
/// recalculates before the order can be saved, so a stale total is never
/// persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique order identifier.
    id: OrderId,

    /// Version for optimistic concurrency at the record store.
    #[serde(default)]
    version: u64,

    /// Customer who owns the order, once known.
    customer_id: Option<CustomerId>,

    /// Line items in insertion order.
    line_items: Vec<LineItem>,

    billing_address: Option<Address>,
    shipping_address: Option<Address>,

    /// Snapshot of the applied coupon, captured at apply time. The coupon
    /// repository stays authoritative for redemption counts.
    coupon: Option<Coupon>,

    /// Resolved shipping quote in minor units.
    shipping_quote: Money,

    /// Resolved tax quote in minor units.
    tax_quote: Money,

    /// Current totals breakdown.
    totals: TotalsBreakdown,

    /// Selected payment provider plus its opaque data blob.
    gateway: Option<GatewaySelection>,

    status: OrderStatus,
    payment_status: PaymentStatus,

    /// Sum of all refunds recorded so far, never above the grand total.
    #[serde(default)]
    refunded_total: Money,

    /// Append-only transition history.
    status_log: StatusLog,

    /// Arbitrary extensible metadata.
    #[serde(default)]
    metadata: HashMap<String, serde_json::Value>,
}

impl Order {
    /// Creates a new empty order in `Cart` status.
    pub fn new() -> Self {
        Self {
            id: OrderId::new(),
            version: 0,
            customer_id: None,
            line_items: Vec::new(),
            billing_address: None,
            shipping_address: None,
            coupon: None,
            shipping_quote: Money::zero(),
            tax_quote: Money::zero(),
            totals: TotalsBreakdown::default(),
            gateway: None,
            status: OrderStatus::Cart,
            payment_status: PaymentStatus::Unpaid,
            refunded_total: Money::zero(),
            status_log: StatusLog::new(),
            metadata: HashMap::new(),
        }
    }
}

impl Default for Order {
    fn default() -> Self {
        Self::new()
    }
}

// Query methods
impl Order {
    /// Returns the order ID.
    pub fn id(&self) -> OrderId {
        self.id
    }

    /// Returns the current version.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Bumps the version. Called by the record store on save.
    pub fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    /// Returns the customer ID, if one is attached.
    pub fn customer_id(&self) -> Option<CustomerId> {
        self.customer_id
    }

    /// Returns the line items in insertion order.
    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    /// Returns the line item for a product, if present.
    pub fn line_item(&self, product_id: &ProductId) -> Option<&LineItem> {
        self.line_items.iter().find(|i| &i.product_id == product_id)
    }

    /// Returns true if the order has line items.
    pub fn has_items(&self) -> bool {
        !self.line_items.is_empty()
    }

    /// Returns the applied coupon snapshot, if any.
    pub fn coupon(&self) -> Option<&Coupon> {
        self.coupon.as_ref()
    }

    /// Returns the billing address.
    pub fn billing_address(&self) -> Option<&Address> {
        self.billing_address.as_ref()
    }

    /// Returns the shipping address.
    pub fn shipping_address(&self) -> Option<&Address> {
        self.shipping_address.as_ref()
    }

    /// Returns the current totals breakdown.
    pub fn totals(&self) -> TotalsBreakdown {
        self.totals
    }

    /// Returns the grand total.
    pub fn grand_total(&self) -> Money {
        self.totals.grand_total
    }

    /// Returns true if there is nothing to pay.
    pub fn is_free(&self) -> bool {
        self.totals.grand_total.is_zero()
    }

    /// Returns the selected gateway, if any.
    pub fn gateway(&self) -> Option<&GatewaySelection> {
        self.gateway.as_ref()
    }

    /// Returns the commercial status.
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Returns the payment status.
    pub fn payment_status(&self) -> PaymentStatus {
        self.payment_status
    }

    /// Returns the total amount refunded so far.
    pub fn refunded_total(&self) -> Money {
        self.refunded_total
    }

    /// Returns the outstanding refundable balance.
    pub fn refundable_balance(&self) -> Money {
        self.totals.grand_total.saturating_sub(self.refunded_total)
    }

    /// Returns the transition history.
    pub fn status_log(&self) -> &StatusLog {
        &self.status_log
    }

    /// Returns the metadata map.
    pub fn metadata(&self) -> &HashMap<String, serde_json::Value> {
        &self.metadata
    }

    /// Product ids of all line items, used for coupon eligibility checks.
    fn product_ids(&self) -> Vec<ProductId> {
        self.line_items.iter().map(|i| i.product_id.clone()).collect()
    }

    /// Builds a human-oriented receipt of the order, line by line.
    pub fn receipt(&self) -> String {
        let mut lines: Vec<String> = self
            .line_items
            .iter()
            .map(|i| format!("{} x{} — {}", i.product_id, i.quantity, i.total()))
            .collect();

        lines.push(format!("Items: {}", self.totals.items_total));
        if let Some(ref coupon) = self.coupon {
            lines.push(format!("Coupon {}: -{}", coupon.code, self.totals.coupon_total));
        }
        lines.push(format!("Shipping: {}", self.totals.shipping_total));
        lines.push(format!("Tax: {}", self.totals.tax_total));
        lines.push(format!("Total: {}", self.totals.grand_total));
        lines.join("\n")
    }
}

// Cart mutations. Each one recalculates totals before returning.
impl Order {
    fn ensure_modifiable(&self, action: &'static str) -> Result<(), OrderError> {
        if !self.status.can_modify() {
            return Err(OrderError::InvalidStatusTransition {
                status: self.status,
                action,
            });
        }
        Ok(())
    }

    /// Attaches a customer to the order.
    pub fn set_customer(&mut self, customer_id: CustomerId) {
        self.customer_id = Some(customer_id);
    }

    /// Adds a line item with a captured unit total.
    ///
    /// Adding a product that is already in the order merges quantities
    /// instead of creating a second line.
    pub fn add_line_item(
        &mut self,
        product_id: impl Into<ProductId>,
        quantity: u32,
        unit_total: Money,
    ) -> Result<(), OrderError> {
        self.ensure_modifiable("add line item")?;

        if quantity == 0 {
            return Err(OrderError::InvalidQuantity { quantity });
        }

        let product_id = product_id.into();
        if let Some(existing) = self
            .line_items
            .iter_mut()
            .find(|i| i.product_id == product_id)
        {
            existing.quantity += quantity;
        } else {
            self.line_items.push(LineItem::new(product_id, quantity, unit_total));
        }

        self.recalculate();
        Ok(())
    }

    /// Removes a line item. The order of remaining items is preserved.
    pub fn remove_line_item(&mut self, product_id: &ProductId) -> Result<(), OrderError> {
        self.ensure_modifiable("remove line item")?;

        let before = self.line_items.len();
        self.line_items.retain(|i| &i.product_id != product_id);
        if self.line_items.len() == before {
            return Err(OrderError::ItemNotFound {
                product_id: product_id.to_string(),
            });
        }

        self.recalculate();
        Ok(())
    }

    /// Updates the quantity of an existing line item. Zero removes it.
    pub fn update_quantity(
        &mut self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), OrderError> {
        self.ensure_modifiable("update quantity")?;

        if quantity == 0 {
            return self.remove_line_item(product_id);
        }

        let item = self
            .line_items
            .iter_mut()
            .find(|i| &i.product_id == product_id)
            .ok_or_else(|| OrderError::ItemNotFound {
                product_id: product_id.to_string(),
            })?;

        item.quantity = quantity;
        self.recalculate();
        Ok(())
    }

    /// Applies a coupon after checking its constraints against the current
    /// order snapshot. Replaces any previously applied coupon; an
    /// ineligible coupon leaves the order untouched.
    pub fn apply_coupon(&mut self, coupon: Coupon, now: DateTime<Utc>) -> Result<(), OrderError> {
        self.ensure_modifiable("apply coupon")?;

        coupon.check(self.totals.items_total, &self.product_ids(), now)?;

        self.coupon = Some(coupon);
        self.recalculate();
        Ok(())
    }

    /// Removes the applied coupon, if any.
    pub fn remove_coupon(&mut self) -> Result<(), OrderError> {
        self.ensure_modifiable("remove coupon")?;
        self.coupon = None;
        self.recalculate();
        Ok(())
    }

    /// Sets the billing address.
    pub fn set_billing_address(&mut self, address: Option<Address>) -> Result<(), OrderError> {
        self.ensure_modifiable("set billing address")?;
        self.billing_address = address;
        self.recalculate();
        Ok(())
    }

    /// Sets the shipping address. Callers must re-resolve shipping and tax
    /// quotes afterwards, since addresses affect them.
    pub fn set_shipping_address(&mut self, address: Option<Address>) -> Result<(), OrderError> {
        self.ensure_modifiable("set shipping address")?;
        self.shipping_address = address;
        self.recalculate();
        Ok(())
    }

    /// Stores freshly resolved shipping and tax quotes.
    pub fn set_quotes(&mut self, shipping: Money, tax: Money) {
        self.shipping_quote = shipping;
        self.tax_quote = tax;
        self.recalculate();
    }

    /// Selects a payment provider for the order.
    pub fn select_gateway(&mut self, selection: GatewaySelection) {
        self.gateway = Some(selection);
    }

    /// Writes a value into the opaque provider data blob.
    pub fn set_gateway_data(&mut self, data: serde_json::Value) {
        if let Some(ref mut selection) = self.gateway {
            selection.data = data;
        }
    }

    /// Sets a metadata value.
    pub fn set_metadata(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.metadata.insert(key.into(), value);
    }

    fn recalculate(&mut self) {
        self.totals = totals::compute(
            &self.line_items,
            self.coupon.as_ref(),
            self.shipping_quote,
            self.tax_quote,
        );
    }
}

// Payment transitions. Side-effect orchestration (stock, events) lives in
// the gateway crate's payment processor; the aggregate only enforces the
// state machine and keeps the status log.
impl Order {
    /// Marks the order as paid through the given gateway.
    ///
    /// Allowed only from `Unpaid`. Moves `Cart` orders to `Placed` and
    /// appends a `paid` entry to the status log. An order with no line
    /// items may still be marked paid; the rule against empty checkouts
    /// lives in checkout validation.
    pub fn mark_paid(&mut self, gateway_ref: &str) -> Result<(), OrderError> {
        if !self.payment_status.can_mark_paid() {
            return Err(OrderError::InvalidPaymentTransition {
                status: self.payment_status,
                action: "mark paid",
            });
        }

        self.payment_status = PaymentStatus::Paid;
        if self.status.can_place() {
            self.status = OrderStatus::Placed;
        }
        self.status_log
            .append("paid", serde_json::json!({ "gateway": gateway_ref }));
        Ok(())
    }

    /// Records a capture failure reported by the provider.
    pub fn mark_payment_failed(&mut self, reason: &str) -> Result<(), OrderError> {
        if !self.payment_status.can_mark_failed() {
            return Err(OrderError::InvalidPaymentTransition {
                status: self.payment_status,
                action: "mark failed",
            });
        }

        self.payment_status = PaymentStatus::Failed;
        self.status_log
            .append("payment_failed", serde_json::json!({ "reason": reason }));
        Ok(())
    }

    /// Records a refund of `amount`.
    ///
    /// Allowed only from `Paid` or `PartiallyRefunded`. Refunds accumulate:
    /// the order stays `PartiallyRefunded` until the refunded total reaches
    /// the grand total, at which point it settles as `Refunded`. A refund
    /// that would push the total past the grand total is rejected.
    pub fn record_refund(&mut self, amount: Money) -> Result<(), OrderError> {
        if !self.payment_status.can_refund() {
            return Err(OrderError::InvalidPaymentTransition {
                status: self.payment_status,
                action: "refund",
            });
        }

        let remaining = self.totals.grand_total.saturating_sub(self.refunded_total);
        if amount > remaining {
            return Err(OrderError::RefundExceedsBalance { amount, remaining });
        }

        self.refunded_total = self.refunded_total + amount;
        self.payment_status = if self.refunded_total < self.totals.grand_total {
            PaymentStatus::PartiallyRefunded
        } else {
            PaymentStatus::Refunded
        };
        self.status_log
            .append("refunded", serde_json::json!({ "amount": amount.cents() }));
        Ok(())
    }

    /// Completes a placed order.
    pub fn complete(&mut self) -> Result<(), OrderError> {
        if !self.status.can_complete() {
            return Err(OrderError::InvalidStatusTransition {
                status: self.status,
                action: "complete",
            });
        }

        self.status = OrderStatus::Completed;
        self.status_log.append("completed", serde_json::Value::Null);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coupon::DiscountKind;

    fn cart_with_widget() -> Order {
        let mut order = Order::new();
        order
            .add_line_item("SKU-001", 2, Money::from_cents(1000))
            .unwrap();
        order
    }

    #[test]
    fn test_new_order_is_an_unpaid_cart() {
        let order = Order::new();
        assert_eq!(order.status(), OrderStatus::Cart);
        assert_eq!(order.payment_status(), PaymentStatus::Unpaid);
        assert!(!order.has_items());
        assert!(order.is_free());
    }

    #[test]
    fn test_add_line_item_recalculates() {
        let order = cart_with_widget();
        assert_eq!(order.totals().items_total.cents(), 2000);
        assert_eq!(order.grand_total().cents(), 2000);
    }

    #[test]
    fn test_add_same_product_merges_quantity() {
        let mut order = cart_with_widget();
        order
            .add_line_item("SKU-001", 3, Money::from_cents(1000))
            .unwrap();

        assert_eq!(order.line_items().len(), 1);
        assert_eq!(order.line_items()[0].quantity, 5);
        assert_eq!(order.grand_total().cents(), 5000);
    }

    #[test]
    fn test_add_zero_quantity_fails() {
        let mut order = Order::new();
        let result = order.add_line_item("SKU-001", 0, Money::from_cents(1000));
        assert!(matches!(result, Err(OrderError::InvalidQuantity { .. })));
    }

    #[test]
    fn test_remove_preserves_remaining_order() {
        let mut order = cart_with_widget();
        order
            .add_line_item("SKU-002", 1, Money::from_cents(500))
            .unwrap();
        order
            .add_line_item("SKU-003", 1, Money::from_cents(250))
            .unwrap();

        order.remove_line_item(&ProductId::new("SKU-002")).unwrap();

        let ids: Vec<&str> = order
            .line_items()
            .iter()
            .map(|i| i.product_id.as_str())
            .collect();
        assert_eq!(ids, vec!["SKU-001", "SKU-003"]);
        assert_eq!(order.grand_total().cents(), 2250);
    }

    #[test]
    fn test_remove_missing_item_fails() {
        let mut order = cart_with_widget();
        let result = order.remove_line_item(&ProductId::new("SKU-999"));
        assert!(matches!(result, Err(OrderError::ItemNotFound { .. })));
    }

    #[test]
    fn test_update_quantity_to_zero_removes() {
        let mut order = cart_with_widget();
        order
            .update_quantity(&ProductId::new("SKU-001"), 0)
            .unwrap();
        assert!(!order.has_items());
        assert!(order.is_free());
    }

    #[test]
    fn test_apply_coupon_recalculates() {
        let mut order = cart_with_widget();
        let coupon = Coupon::new("TEN", DiscountKind::Percentage, 10);
        order.apply_coupon(coupon, Utc::now()).unwrap();

        assert_eq!(order.totals().coupon_total.cents(), 200);
        assert_eq!(order.grand_total().cents(), 1800);
    }

    #[test]
    fn test_reapply_replaces_never_stacks() {
        let mut order = cart_with_widget();
        order
            .apply_coupon(Coupon::new("TEN", DiscountKind::Percentage, 10), Utc::now())
            .unwrap();
        order
            .apply_coupon(Coupon::new("FIVE", DiscountKind::Percentage, 5), Utc::now())
            .unwrap();

        assert_eq!(order.coupon().unwrap().code, "FIVE");
        assert_eq!(order.totals().coupon_total.cents(), 100);
    }

    #[test]
    fn test_ineligible_coupon_leaves_totals_unchanged() {
        let mut order = cart_with_widget();
        let mut coupon = Coupon::new("MIN", DiscountKind::Percentage, 10);
        coupon.constraints.minimum_spend = Some(Money::from_cents(10_000));

        let before = order.totals();
        let result = order.apply_coupon(coupon, Utc::now());

        assert!(matches!(result, Err(OrderError::Coupon(_))));
        assert!(order.coupon().is_none());
        assert_eq!(order.totals(), before);
    }

    #[test]
    fn test_quotes_feed_grand_total() {
        let mut order = cart_with_widget();
        order.set_quotes(Money::from_cents(500), Money::from_cents(160));
        assert_eq!(order.grand_total().cents(), 2660);
    }

    #[test]
    fn test_mark_paid_from_unpaid() {
        let mut order = cart_with_widget();
        order.mark_paid("dummy").unwrap();

        assert_eq!(order.payment_status(), PaymentStatus::Paid);
        assert_eq!(order.status(), OrderStatus::Placed);
        assert!(order.status_log().contains("paid"));
    }

    #[test]
    fn test_mark_paid_twice_is_rejected_by_the_aggregate() {
        let mut order = cart_with_widget();
        order.mark_paid("dummy").unwrap();

        let result = order.mark_paid("dummy");
        assert!(matches!(
            result,
            Err(OrderError::InvalidPaymentTransition { .. })
        ));
        assert_eq!(order.status_log().count("paid"), 1);
    }

    #[test]
    fn test_empty_order_can_be_marked_paid() {
        let mut order = Order::new();
        order.mark_paid("dummy").unwrap();
        assert_eq!(order.payment_status(), PaymentStatus::Paid);
    }

    #[test]
    fn test_no_modification_after_placement() {
        let mut order = cart_with_widget();
        order.mark_paid("dummy").unwrap();

        let result = order.add_line_item("SKU-002", 1, Money::from_cents(100));
        assert!(matches!(
            result,
            Err(OrderError::InvalidStatusTransition { .. })
        ));
    }

    #[test]
    fn test_refund_from_unpaid_is_rejected() {
        let mut order = cart_with_widget();
        let result = order.record_refund(Money::from_cents(100));
        assert!(matches!(
            result,
            Err(OrderError::InvalidPaymentTransition { .. })
        ));
    }

    #[test]
    fn test_partial_then_full_refund() {
        let mut order = cart_with_widget();
        order.mark_paid("dummy").unwrap();

        order.record_refund(Money::from_cents(500)).unwrap();
        assert_eq!(order.payment_status(), PaymentStatus::PartiallyRefunded);

        order.record_refund(Money::from_cents(1500)).unwrap();
        assert_eq!(order.payment_status(), PaymentStatus::Refunded);

        let result = order.record_refund(Money::from_cents(1));
        assert!(matches!(
            result,
            Err(OrderError::InvalidPaymentTransition { .. })
        ));
    }

    #[test]
    fn test_refund_cannot_exceed_captured_amount() {
        let mut order = cart_with_widget();
        order.mark_paid("dummy").unwrap();

        order.record_refund(Money::from_cents(1500)).unwrap();
        assert_eq!(order.refunded_total(), Money::from_cents(1500));
        assert_eq!(order.refundable_balance(), Money::from_cents(500));

        let result = order.record_refund(Money::from_cents(1500));
        assert!(matches!(
            result,
            Err(OrderError::RefundExceedsBalance { .. })
        ));
        assert_eq!(order.payment_status(), PaymentStatus::PartiallyRefunded);
        assert_eq!(order.refunded_total(), Money::from_cents(1500));
    }

    #[test]
    fn test_full_refund_of_exact_grand_total() {
        let mut order = cart_with_widget();
        order.mark_paid("dummy").unwrap();
        order.record_refund(order.grand_total()).unwrap();
        assert_eq!(order.payment_status(), PaymentStatus::Refunded);
    }

    #[test]
    fn test_payment_failure_path() {
        let mut order = cart_with_widget();
        order.mark_payment_failed("card declined").unwrap();

        assert_eq!(order.payment_status(), PaymentStatus::Failed);
        assert_eq!(order.status(), OrderStatus::Cart);
        assert!(order.status_log().contains("payment_failed"));
    }

    #[test]
    fn test_complete_requires_placed() {
        let mut order = cart_with_widget();
        assert!(order.complete().is_err());

        order.mark_paid("dummy").unwrap();
        order.complete().unwrap();
        assert_eq!(order.status(), OrderStatus::Completed);
        assert!(order.status().is_terminal());
    }

    #[test]
    fn test_receipt_lists_items_and_totals() {
        let mut order = cart_with_widget();
        order
            .apply_coupon(Coupon::new("TEN", DiscountKind::Percentage, 10), Utc::now())
            .unwrap();

        let receipt = order.receipt();
        assert!(receipt.contains("SKU-001 x2"));
        assert!(receipt.contains("Coupon TEN"));
        assert!(receipt.contains("Total: 18.00"));
    }

    #[test]
    fn test_serialization_roundtrip() {
        let mut order = cart_with_widget();
        order.select_gateway(GatewaySelection::new("dummy"));
        order.mark_paid("dummy").unwrap();

        let json = serde_json::to_string(&order).unwrap();
        let back: Order = serde_json::from_str(&json).unwrap();

        assert_eq!(back.id(), order.id());
        assert_eq!(back.payment_status(), PaymentStatus::Paid);
        assert_eq!(back.grand_total(), order.grand_total());
        assert_eq!(back.status_log().len(), order.status_log().len());
    }
}
