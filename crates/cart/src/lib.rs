//! Cart resolution for the storefront commerce core.
//!
//! A cart is an order in `Cart` status; this crate decides which cart a
//! given request belongs to. Resolution is two-tier: a request-local
//! cache answers repeat lookups within one request, and a durable cookie
//! carries the cart id across requests. Cookie keys are scoped per site
//! when the deployment runs several storefronts without a shared cart.

pub mod context;
pub mod driver;
pub mod error;
pub mod site;

pub use context::{QueuedCookie, RequestContext};
pub use driver::{CartDriver, CookieDriver};
pub use error::{CartError, Result};
pub use site::{Site, Sites};
