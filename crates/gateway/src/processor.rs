//! Payment processor: drives the order state machine from capture
//! outcomes.
//!
//! Transitions on a single order are linearized through a per-order async
//! lock, so concurrent duplicate webhook deliveries can never
//! double-decrement stock or double-append status-log entries.

use std::collections::HashMap;
use std::sync::Arc;

use common::OrderId;
use domain::{Money, Order, PaymentStatus};
use store::{CouponRepository, OrderRepository, ProductRepository, StoreError};
use tokio::sync::Mutex;

use crate::error::Result;
use crate::events::{CommerceEvent, EventSink};

/// Bounded retries for saves racing against cart mutations.
const MAX_SAVE_ATTEMPTS: u32 = 3;

/// Whether refunds put the refunded items back into stock.
///
/// The source behavior never restocked; the flag exists so deployments
/// can opt in.
#[derive(Debug, Clone, Copy, Default)]
pub struct RefundPolicy {
    pub restock: bool,
}

/// Outcome of a `mark_order_as_paid` invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkPaidOutcome {
    /// The transition ran and its side effects were performed.
    Updated,

    /// The order was already paid; nothing happened. Returned as success
    /// so webhook redeliveries stay safe.
    AlreadyPaid,
}

/// Orchestrates payment transitions over the record store and event sink.
///
/// Gateways never touch repositories directly; every capture and refund
/// outcome flows through here.
pub struct PaymentProcessor {
    orders: Arc<dyn OrderRepository>,
    products: Arc<dyn ProductRepository>,
    coupons: Arc<dyn CouponRepository>,
    events: Arc<dyn EventSink>,
    refund_policy: RefundPolicy,
    locks: Mutex<HashMap<OrderId, Arc<Mutex<()>>>>,
}

impl PaymentProcessor {
    /// Creates a new processor over the given collaborators.
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        products: Arc<dyn ProductRepository>,
        coupons: Arc<dyn CouponRepository>,
        events: Arc<dyn EventSink>,
        refund_policy: RefundPolicy,
    ) -> Self {
        Self {
            orders,
            products,
            coupons,
            events,
            refund_policy,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the order repository, for gateways that need to load the
    /// order they are capturing.
    pub fn orders(&self) -> &Arc<dyn OrderRepository> {
        &self.orders
    }

    async fn order_lock(&self, order_id: OrderId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(order_id).or_default().clone()
    }

    /// Marks an order as paid through the named gateway.
    ///
    /// Allowed only from `Unpaid`. Side effects run exactly once per
    /// order id no matter how many times the transition is invoked
    /// concurrently: stock is decremented per line item, a `paid` entry
    /// lands in the status log, a `Cart` order becomes `Placed`, the
    /// applied coupon's redemption count is incremented, and a
    /// `PaymentStatusUpdated` event is emitted with the gateway used.
    /// Re-invocation on an already-paid order is a success no-op.
    #[tracing::instrument(skip(self))]
    pub async fn mark_order_as_paid(
        &self,
        order_id: OrderId,
        gateway_ref: &str,
    ) -> Result<MarkPaidOutcome> {
        let lock = self.order_lock(order_id).await;
        let _guard = lock.lock().await;

        let mut attempt = 0;
        let order = loop {
            attempt += 1;

            let mut order = self.orders.find(order_id).await?;
            if order.payment_status() == PaymentStatus::Paid {
                tracing::debug!(%order_id, "order already paid, skipping");
                return Ok(MarkPaidOutcome::AlreadyPaid);
            }

            order.mark_paid(gateway_ref)?;

            match self.orders.save(&mut order).await {
                Ok(()) => break order,
                Err(StoreError::VersionConflict { .. }) if attempt < MAX_SAVE_ATTEMPTS => {
                    tracing::debug!(%order_id, attempt, "save conflict, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        };

        // Post-transition side effects. The per-order lock is still held,
        // and the order is already saved as paid, so redelivery cannot
        // reach this point twice.
        // The order is already saved as paid, so a stock shortfall here
        // must not bubble up and present the capture as retryable.
        for item in order.line_items() {
            match self
                .products
                .adjust_stock(&item.product_id, -(item.quantity as i64))
                .await
            {
                Ok(remaining) => {
                    tracing::debug!(product_id = %item.product_id, remaining, "stock decremented");
                }
                Err(e) => {
                    tracing::warn!(product_id = %item.product_id, error = %e, "stock not decremented after capture");
                }
            }
        }

        if let Some(coupon) = order.coupon() {
            match self.coupons.find(&coupon.code).await {
                Ok(mut stored) => {
                    stored.redeem();
                    self.coupons.save(&stored).await?;
                }
                Err(StoreError::CouponNotFound(code)) => {
                    tracing::warn!(%code, "applied coupon no longer exists, skipping redemption");
                }
                Err(e) => return Err(e.into()),
            }
        }

        self.events
            .emit(CommerceEvent::payment_status_updated(
                order_id,
                PaymentStatus::Paid,
                gateway_ref,
            ))
            .await;

        metrics::counter!("payments_captured").increment(1);
        tracing::info!(%order_id, gateway = gateway_ref, "order marked as paid");
        Ok(MarkPaidOutcome::Updated)
    }

    /// Records a refund of `amount` against a paid order.
    ///
    /// Refunds accumulate on the order: it stays `PartiallyRefunded` until
    /// the refunded total reaches the grand total, and an amount above the
    /// outstanding balance is rejected. Restocking only happens when the
    /// policy opts in.
    #[tracing::instrument(skip(self))]
    pub async fn refund(&self, order_id: OrderId, amount: Money, gateway_ref: &str) -> Result<()> {
        let lock = self.order_lock(order_id).await;
        let _guard = lock.lock().await;

        let mut attempt = 0;
        let order = loop {
            attempt += 1;

            let mut order = self.orders.find(order_id).await?;
            order.record_refund(amount)?;

            match self.orders.save(&mut order).await {
                Ok(()) => break order,
                Err(StoreError::VersionConflict { .. }) if attempt < MAX_SAVE_ATTEMPTS => {
                    tracing::debug!(%order_id, attempt, "save conflict, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        };

        if self.refund_policy.restock {
            for item in order.line_items() {
                self.products
                    .adjust_stock(&item.product_id, item.quantity as i64)
                    .await?;
            }
        }

        self.events
            .emit(CommerceEvent::payment_status_updated(
                order_id,
                order.payment_status(),
                gateway_ref,
            ))
            .await;

        metrics::counter!("payments_refunded").increment(1);
        tracing::info!(%order_id, amount = amount.cents(), "refund recorded");
        Ok(())
    }

    /// Records a definitive capture failure reported by the provider
    /// (offsite failure notifications). The order moves to `Failed`.
    #[tracing::instrument(skip(self))]
    pub async fn mark_order_as_failed(&self, order_id: OrderId, reason: &str) -> Result<()> {
        let lock = self.order_lock(order_id).await;
        let _guard = lock.lock().await;

        let mut order = self.orders.find(order_id).await?;
        if order.payment_status() == PaymentStatus::Failed {
            return Ok(());
        }

        order.mark_payment_failed(reason)?;
        self.orders.save(&mut order).await?;

        self.events
            .emit(CommerceEvent::order_payment_failed(order_id, reason))
            .await;

        metrics::counter!("payment_failures").increment(1);
        Ok(())
    }

    /// Emits a capture-failure event without transitioning the order.
    ///
    /// Used by onsite checkout declines, where the buyer can retry and
    /// the order must stay `Unpaid`.
    pub async fn report_capture_failure(&self, order_id: OrderId, reason: &str) {
        self.events
            .emit(CommerceEvent::order_payment_failed(order_id, reason))
            .await;
        metrics::counter!("payment_failures").increment(1);
    }

    /// Loads an order snapshot, e.g. for building receipts.
    pub async fn find_order(&self, order_id: OrderId) -> Result<Order> {
        Ok(self.orders.find(order_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{Coupon, DiscountKind, Money, Product};
    use store::{InMemoryCoupons, InMemoryOrders, InMemoryProducts};

    use crate::events::InMemoryEventSink;

    struct Fixture {
        orders: Arc<InMemoryOrders>,
        products: Arc<InMemoryProducts>,
        coupons: Arc<InMemoryCoupons>,
        events: Arc<InMemoryEventSink>,
        processor: Arc<PaymentProcessor>,
    }

    fn fixture_with_policy(policy: RefundPolicy) -> Fixture {
        let orders = Arc::new(InMemoryOrders::new());
        let products = Arc::new(InMemoryProducts::new());
        let coupons = Arc::new(InMemoryCoupons::new());
        let events = Arc::new(InMemoryEventSink::new());
        let processor = Arc::new(PaymentProcessor::new(
            orders.clone(),
            products.clone(),
            coupons.clone(),
            events.clone(),
            policy,
        ));
        Fixture {
            orders,
            products,
            coupons,
            events,
            processor,
        }
    }

    fn fixture() -> Fixture {
        fixture_with_policy(RefundPolicy::default())
    }

    async fn seed_order(fx: &Fixture) -> OrderId {
        fx.products
            .save(&Product::new("SKU-001", "Widget", Money::from_cents(1500), 10))
            .await
            .unwrap();

        let mut order = Order::new();
        order
            .add_line_item("SKU-001", 1, Money::from_cents(1500))
            .unwrap();
        fx.orders.save(&mut order).await.unwrap();
        order.id()
    }

    #[tokio::test]
    async fn test_mark_paid_performs_side_effects() {
        let fx = fixture();
        let order_id = seed_order(&fx).await;

        let outcome = fx
            .processor
            .mark_order_as_paid(order_id, "dummy")
            .await
            .unwrap();
        assert_eq!(outcome, MarkPaidOutcome::Updated);

        let order = fx.orders.find(order_id).await.unwrap();
        assert_eq!(order.payment_status(), PaymentStatus::Paid);
        assert_eq!(order.status(), domain::OrderStatus::Placed);
        assert!(order.status_log().contains("paid"));

        let stock = fx.products.stock(&"SKU-001".into()).await.unwrap();
        assert_eq!(stock, 9);
        assert_eq!(fx.events.payment_updates_for(order_id).await, 1);
    }

    #[tokio::test]
    async fn test_duplicate_mark_paid_is_a_noop() {
        let fx = fixture();
        let order_id = seed_order(&fx).await;

        fx.processor
            .mark_order_as_paid(order_id, "dummy")
            .await
            .unwrap();
        let second = fx
            .processor
            .mark_order_as_paid(order_id, "dummy")
            .await
            .unwrap();

        assert_eq!(second, MarkPaidOutcome::AlreadyPaid);

        let order = fx.orders.find(order_id).await.unwrap();
        assert_eq!(order.status_log().count("paid"), 1);
        assert_eq!(fx.products.stock(&"SKU-001".into()).await.unwrap(), 9);
        assert_eq!(fx.events.payment_updates_for(order_id).await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_mark_paid_decrements_once() {
        let fx = fixture();
        let order_id = seed_order(&fx).await;

        let mut handles = Vec::new();
        for _ in 0..10 {
            let processor = fx.processor.clone();
            handles.push(tokio::spawn(async move {
                processor.mark_order_as_paid(order_id, "dummy").await.unwrap()
            }));
        }

        let mut updated = 0;
        for handle in handles {
            if handle.await.unwrap() == MarkPaidOutcome::Updated {
                updated += 1;
            }
        }

        assert_eq!(updated, 1);
        assert_eq!(fx.products.stock(&"SKU-001".into()).await.unwrap(), 9);
        assert_eq!(fx.events.payment_updates_for(order_id).await, 1);
    }

    #[tokio::test]
    async fn test_mark_paid_redeems_coupon() {
        let fx = fixture();
        fx.coupons
            .save(&Coupon::new("TEN", DiscountKind::Percentage, 10))
            .await
            .unwrap();
        fx.products
            .save(&Product::new("SKU-001", "Widget", Money::from_cents(1500), 10))
            .await
            .unwrap();

        let mut order = Order::new();
        order
            .add_line_item("SKU-001", 1, Money::from_cents(1500))
            .unwrap();
        order
            .apply_coupon(
                Coupon::new("TEN", DiscountKind::Percentage, 10),
                chrono::Utc::now(),
            )
            .unwrap();
        fx.orders.save(&mut order).await.unwrap();

        fx.processor
            .mark_order_as_paid(order.id(), "dummy")
            .await
            .unwrap();

        let coupon = fx.coupons.find("TEN").await.unwrap();
        assert_eq!(coupon.redeemed, 1);
    }

    #[tokio::test]
    async fn test_mark_paid_missing_order() {
        let fx = fixture();
        let result = fx.processor.mark_order_as_paid(OrderId::new(), "dummy").await;
        assert!(matches!(
            result,
            Err(crate::GatewayError::Store(StoreError::OrderNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_mark_paid_survives_stock_shortfall() {
        let fx = fixture();
        fx.products
            .save(&Product::new("SKU-001", "Widget", Money::from_cents(1500), 0))
            .await
            .unwrap();

        let mut order = Order::new();
        order
            .add_line_item("SKU-001", 1, Money::from_cents(1500))
            .unwrap();
        fx.orders.save(&mut order).await.unwrap();

        let outcome = fx
            .processor
            .mark_order_as_paid(order.id(), "dummy")
            .await
            .unwrap();
        assert_eq!(outcome, MarkPaidOutcome::Updated);

        let stored = fx.orders.find(order.id()).await.unwrap();
        assert_eq!(stored.payment_status(), PaymentStatus::Paid);
        assert_eq!(fx.products.stock(&"SKU-001".into()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_refund_transitions_and_does_not_restock_by_default() {
        let fx = fixture();
        let order_id = seed_order(&fx).await;
        fx.processor
            .mark_order_as_paid(order_id, "dummy")
            .await
            .unwrap();

        fx.processor
            .refund(order_id, Money::from_cents(500), "dummy")
            .await
            .unwrap();
        let order = fx.orders.find(order_id).await.unwrap();
        assert_eq!(order.payment_status(), PaymentStatus::PartiallyRefunded);

        fx.processor
            .refund(order_id, Money::from_cents(1000), "dummy")
            .await
            .unwrap();
        let order = fx.orders.find(order_id).await.unwrap();
        assert_eq!(order.payment_status(), PaymentStatus::Refunded);
        assert_eq!(order.refunded_total(), Money::from_cents(1500));

        // Stock stays where capture left it.
        assert_eq!(fx.products.stock(&"SKU-001".into()).await.unwrap(), 9);
    }

    #[tokio::test]
    async fn test_refund_restocks_when_policy_opts_in() {
        let fx = fixture_with_policy(RefundPolicy { restock: true });
        let order_id = seed_order(&fx).await;
        fx.processor
            .mark_order_as_paid(order_id, "dummy")
            .await
            .unwrap();

        fx.processor
            .refund(order_id, Money::from_cents(1500), "dummy")
            .await
            .unwrap();

        assert_eq!(fx.products.stock(&"SKU-001".into()).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_refund_from_unpaid_is_rejected() {
        let fx = fixture();
        let order_id = seed_order(&fx).await;

        let result = fx
            .processor
            .refund(order_id, Money::from_cents(100), "dummy")
            .await;
        assert!(matches!(result, Err(crate::GatewayError::Order(_))));
    }

    #[tokio::test]
    async fn test_mark_failed_emits_event_and_is_idempotent() {
        let fx = fixture();
        let order_id = seed_order(&fx).await;

        fx.processor
            .mark_order_as_failed(order_id, "declined")
            .await
            .unwrap();
        fx.processor
            .mark_order_as_failed(order_id, "declined")
            .await
            .unwrap();

        let order = fx.orders.find(order_id).await.unwrap();
        assert_eq!(order.payment_status(), PaymentStatus::Failed);
        assert_eq!(order.status_log().count("payment_failed"), 1);
        assert_eq!(fx.events.count().await, 1);
    }
}
