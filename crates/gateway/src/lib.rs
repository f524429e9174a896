//! Payment gateway protocol for the storefront commerce core.
//!
//! A gateway is a payment-provider integration implementing the
//! prepare/checkout/refund/webhook contract. Onsite gateways capture
//! synchronously during checkout; offsite gateways capture asynchronously
//! through provider-initiated webhooks. Both drive the order state machine
//! through the [`PaymentProcessor`], which owns idempotency and per-order
//! serialization.

pub mod dummy;
pub mod error;
pub mod events;
pub mod hosted;
pub mod processor;
pub mod protocol;
pub mod registry;
pub mod rules;

pub use dummy::DummyGateway;
pub use error::{GatewayError, Result};
pub use events::{CommerceEvent, EventSink, InMemoryEventSink, LogEventSink};
pub use hosted::HostedGateway;
pub use processor::{MarkPaidOutcome, PaymentProcessor, RefundPolicy};
pub use protocol::{Gateway, Receipt, RefundRecord, WebhookAck};
pub use registry::GatewayRegistry;
pub use rules::{CheckoutRule, FieldError, FieldKind, validate};
