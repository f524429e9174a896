//! Commerce events emitted by the payment processor.
//!
//! Consumers (mail, logging, analytics) are external collaborators; the
//! core only publishes through the [`EventSink`] trait.

use std::sync::Arc;

use async_trait::async_trait;
use common::{EventId, OrderId};
use domain::PaymentStatus;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// A notification emitted when the order state machine transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommerceEvent {
    /// The order's payment status changed, carrying the gateway that
    /// drove the transition.
    PaymentStatusUpdated {
        event_id: EventId,
        order_id: OrderId,
        payment_status: PaymentStatus,
        gateway: String,
    },

    /// A capture attempt failed.
    OrderPaymentFailed {
        event_id: EventId,
        order_id: OrderId,
        reason: String,
    },
}

impl CommerceEvent {
    /// Builds a payment-status-updated event.
    pub fn payment_status_updated(
        order_id: OrderId,
        payment_status: PaymentStatus,
        gateway: impl Into<String>,
    ) -> Self {
        Self::PaymentStatusUpdated {
            event_id: EventId::new(),
            order_id,
            payment_status,
            gateway: gateway.into(),
        }
    }

    /// Builds a payment-failed event.
    pub fn order_payment_failed(order_id: OrderId, reason: impl Into<String>) -> Self {
        Self::OrderPaymentFailed {
            event_id: EventId::new(),
            order_id,
            reason: reason.into(),
        }
    }

    /// Returns the order the event concerns.
    pub fn order_id(&self) -> OrderId {
        match self {
            Self::PaymentStatusUpdated { order_id, .. } => *order_id,
            Self::OrderPaymentFailed { order_id, .. } => *order_id,
        }
    }
}

/// Trait for event consumers.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Delivers one event. Emission failures must not roll back the
    /// transition that produced the event.
    async fn emit(&self, event: CommerceEvent);
}

/// Event sink that records everything in memory, for tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventSink {
    events: Arc<RwLock<Vec<CommerceEvent>>>,
}

impl InMemoryEventSink {
    /// Creates a new empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all recorded events in emission order.
    pub async fn events(&self) -> Vec<CommerceEvent> {
        self.events.read().await.clone()
    }

    /// Returns the number of recorded events.
    pub async fn count(&self) -> usize {
        self.events.read().await.len()
    }

    /// Returns the number of `PaymentStatusUpdated` events for an order.
    pub async fn payment_updates_for(&self, order_id: OrderId) -> usize {
        self.events
            .read()
            .await
            .iter()
            .filter(|e| {
                matches!(e, CommerceEvent::PaymentStatusUpdated { order_id: id, .. } if *id == order_id)
            })
            .count()
    }
}

#[async_trait]
impl EventSink for InMemoryEventSink {
    async fn emit(&self, event: CommerceEvent) {
        self.events.write().await.push(event);
    }
}

/// Event sink that logs through tracing, the default server wiring.
#[derive(Debug, Clone, Default)]
pub struct LogEventSink;

#[async_trait]
impl EventSink for LogEventSink {
    async fn emit(&self, event: CommerceEvent) {
        match &event {
            CommerceEvent::PaymentStatusUpdated {
                order_id,
                payment_status,
                gateway,
                ..
            } => {
                tracing::info!(%order_id, %payment_status, %gateway, "payment status updated");
            }
            CommerceEvent::OrderPaymentFailed {
                order_id, reason, ..
            } => {
                tracing::warn!(%order_id, %reason, "order payment failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_sink_records_in_order() {
        let sink = InMemoryEventSink::new();
        let order_id = OrderId::new();

        sink.emit(CommerceEvent::payment_status_updated(
            order_id,
            PaymentStatus::Paid,
            "dummy",
        ))
        .await;
        sink.emit(CommerceEvent::order_payment_failed(order_id, "declined"))
            .await;

        let events = sink.events().await;
        assert_eq!(events.len(), 2);
        assert_eq!(sink.payment_updates_for(order_id).await, 1);
        assert_eq!(events[0].order_id(), order_id);
    }
}
