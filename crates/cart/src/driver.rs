//! Cart drivers.
//!
//! A driver answers "which cart does this request belong to". The cookie
//! driver is the production implementation: the cart id round-trips in a
//! cookie, with a request-local cache in front of it so everything within
//! one request sees the same cart even before the response cookie exists.

use std::sync::Arc;

use async_trait::async_trait;
use common::OrderId;
use domain::Order;
use store::{OrderRepository, StoreError};

use crate::context::RequestContext;
use crate::error::Result;
use crate::site::Sites;

/// Resolves the cart for a request.
#[async_trait]
pub trait CartDriver: Send + Sync {
    /// Returns the request's existing cart, if any.
    async fn current(&self, ctx: &mut RequestContext) -> Result<Option<Order>>;

    /// Returns the request's cart, creating one when none exists.
    async fn resolve(&self, ctx: &mut RequestContext) -> Result<Order>;

    /// Detaches the request from its cart, expiring the cookie. The
    /// order itself is untouched; orders are destroyed only by explicit
    /// deletion.
    fn forget(&self, ctx: &mut RequestContext);
}

/// Cookie-backed cart driver.
///
/// When the deployment serves several storefronts without a shared cart,
/// the cookie key is suffixed with the site handle so each storefront
/// keeps its own cart.
pub struct CookieDriver {
    orders: Arc<dyn OrderRepository>,
    cookie_base: String,
    sites: Sites,
}

impl CookieDriver {
    pub fn new(orders: Arc<dyn OrderRepository>, cookie_base: impl Into<String>, sites: Sites) -> Self {
        Self {
            orders,
            cookie_base: cookie_base.into(),
            sites,
        }
    }

    /// The cookie key this request's cart lives under.
    pub fn cookie_key(&self, ctx: &RequestContext) -> String {
        if self.sites.is_multi_site() && !self.sites.single_cart() {
            format!("{}-{}", self.cookie_base, self.sites.resolve(ctx))
        } else {
            self.cookie_base.clone()
        }
    }

    /// Looks the cart up in the request-local cache first, then the
    /// cookie. A cookie pointing at a deleted order or one that already
    /// left `Cart` status is treated as absent.
    async fn lookup(&self, ctx: &mut RequestContext, key: &str) -> Result<Option<Order>> {
        if let Some(id) = ctx.blink_get(key) {
            match self.orders.find(id).await {
                Ok(order) => return Ok(Some(order)),
                Err(StoreError::OrderNotFound(_)) => ctx.blink_forget(key),
                Err(e) => return Err(e.into()),
            }
        }

        let cookie_id = ctx.cookie(key).and_then(|raw| raw.parse::<OrderId>().ok());
        if let Some(id) = cookie_id {
            match self.orders.find(id).await {
                Ok(order) if order.status().can_modify() => {
                    ctx.blink_set(key, id);
                    return Ok(Some(order));
                }
                Ok(_) => {
                    tracing::debug!(%id, "cookie points at a placed order, ignoring");
                }
                Err(StoreError::OrderNotFound(_)) => {
                    tracing::debug!(%id, "cookie points at a missing order, ignoring");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(None)
    }
}

#[async_trait]
impl CartDriver for CookieDriver {
    async fn current(&self, ctx: &mut RequestContext) -> Result<Option<Order>> {
        let key = self.cookie_key(ctx);
        self.lookup(ctx, &key).await
    }

    async fn resolve(&self, ctx: &mut RequestContext) -> Result<Order> {
        let key = self.cookie_key(ctx);
        if let Some(order) = self.lookup(ctx, &key).await? {
            return Ok(order);
        }

        // Two racing first requests from the same client may each create
        // a cart; the cookie written last wins and the loser is orphaned.
        let mut order = Order::new();
        self.orders.save(&mut order).await?;

        ctx.blink_set(&key, order.id());
        ctx.queue_cookie(&key, Some(order.id().to_string()));
        tracing::debug!(order_id = %order.id(), cookie = key, "created new cart");
        Ok(order)
    }

    fn forget(&self, ctx: &mut RequestContext) {
        let key = self.cookie_key(ctx);
        ctx.blink_forget(&key);
        ctx.queue_cookie(key, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::Money;
    use store::InMemoryOrders;

    use crate::site::Site;

    fn driver(orders: Arc<InMemoryOrders>) -> CookieDriver {
        CookieDriver::new(orders, "cart", Sites::single("default"))
    }

    #[tokio::test]
    async fn test_resolve_creates_cart_and_queues_cookie() {
        let orders = Arc::new(InMemoryOrders::new());
        let driver = driver(orders.clone());
        let mut ctx = RequestContext::new();

        let cart = driver.resolve(&mut ctx).await.unwrap();

        assert_eq!(orders.count().await, 1);
        let queued = ctx.queued_cookies();
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].name, "cart");
        assert_eq!(queued[0].value, Some(cart.id().to_string()));
    }

    #[tokio::test]
    async fn test_repeat_resolves_within_a_request_share_one_cart() {
        let orders = Arc::new(InMemoryOrders::new());
        let driver = driver(orders.clone());
        let mut ctx = RequestContext::new();

        let first = driver.resolve(&mut ctx).await.unwrap();
        let second = driver.resolve(&mut ctx).await.unwrap();

        assert_eq!(first.id(), second.id());
        assert_eq!(orders.count().await, 1);
    }

    #[tokio::test]
    async fn test_resolve_returns_cart_from_cookie() {
        let orders = Arc::new(InMemoryOrders::new());
        let driver = driver(orders.clone());

        let mut existing = Order::new();
        existing
            .add_line_item("SKU-001", 2, Money::from_cents(500))
            .unwrap();
        orders.save(&mut existing).await.unwrap();

        let mut ctx = RequestContext::new().with_cookie("cart", existing.id().to_string());
        let cart = driver.resolve(&mut ctx).await.unwrap();

        assert_eq!(cart.id(), existing.id());
        assert_eq!(cart.line_items().len(), 1);
        assert!(ctx.queued_cookies().is_empty());
    }

    #[tokio::test]
    async fn test_stale_cookie_yields_a_fresh_cart() {
        let orders = Arc::new(InMemoryOrders::new());
        let driver = driver(orders.clone());

        let mut ctx = RequestContext::new().with_cookie("cart", OrderId::new().to_string());
        let cart = driver.resolve(&mut ctx).await.unwrap();

        assert_eq!(ctx.queued_cookies()[0].value, Some(cart.id().to_string()));
        assert_eq!(orders.count().await, 1);
    }

    #[tokio::test]
    async fn test_placed_order_cookie_yields_a_fresh_cart() {
        let orders = Arc::new(InMemoryOrders::new());
        let driver = driver(orders.clone());

        let mut placed = Order::new();
        placed
            .add_line_item("SKU-001", 1, Money::from_cents(500))
            .unwrap();
        placed.mark_paid("dummy").unwrap();
        orders.save(&mut placed).await.unwrap();

        let mut ctx = RequestContext::new().with_cookie("cart", placed.id().to_string());
        let cart = driver.resolve(&mut ctx).await.unwrap();

        assert_ne!(cart.id(), placed.id());
    }

    #[tokio::test]
    async fn test_current_does_not_create() {
        let orders = Arc::new(InMemoryOrders::new());
        let driver = driver(orders.clone());
        let mut ctx = RequestContext::new();

        assert!(driver.current(&mut ctx).await.unwrap().is_none());
        assert_eq!(orders.count().await, 0);
    }

    #[tokio::test]
    async fn test_forget_expires_the_cookie_but_keeps_the_order() {
        let orders = Arc::new(InMemoryOrders::new());
        let driver = driver(orders.clone());
        let mut ctx = RequestContext::new();

        let cart = driver.resolve(&mut ctx).await.unwrap();
        driver.forget(&mut ctx);

        assert_eq!(ctx.queued_cookies()[0].value, None);
        assert!(orders.find(cart.id()).await.is_ok());

        let fresh = driver.resolve(&mut ctx).await.unwrap();
        assert_ne!(fresh.id(), cart.id());
    }

    #[tokio::test]
    async fn test_multi_site_scopes_cookie_keys() {
        let orders = Arc::new(InMemoryOrders::new());
        let sites = Sites::new(
            vec![
                Site {
                    handle: "us".to_string(),
                    host: "shop.example.com".to_string(),
                },
                Site {
                    handle: "eu".to_string(),
                    host: "shop.example.eu".to_string(),
                },
            ],
            "us",
            false,
        );
        let driver = CookieDriver::new(orders.clone(), "cart", sites);

        let mut us_ctx = RequestContext::new().with_host("shop.example.com");
        let mut eu_ctx = RequestContext::new().with_host("shop.example.eu");

        let us_cart = driver.resolve(&mut us_ctx).await.unwrap();
        let eu_cart = driver.resolve(&mut eu_ctx).await.unwrap();

        assert_ne!(us_cart.id(), eu_cart.id());
        assert_eq!(us_ctx.queued_cookies()[0].name, "cart-us");
        assert_eq!(eu_ctx.queued_cookies()[0].name, "cart-eu");
    }

    #[tokio::test]
    async fn test_single_cart_deployments_share_one_key() {
        let orders = Arc::new(InMemoryOrders::new());
        let sites = Sites::new(
            vec![
                Site {
                    handle: "us".to_string(),
                    host: "shop.example.com".to_string(),
                },
                Site {
                    handle: "eu".to_string(),
                    host: "shop.example.eu".to_string(),
                },
            ],
            "us",
            true,
        );
        let driver = CookieDriver::new(orders.clone(), "cart", sites);

        let mut us_ctx = RequestContext::new().with_host("shop.example.com");
        let us_cart = driver.resolve(&mut us_ctx).await.unwrap();

        let mut eu_ctx = RequestContext::new()
            .with_host("shop.example.eu")
            .with_cookie("cart", us_cart.id().to_string());
        let eu_cart = driver.resolve(&mut eu_ctx).await.unwrap();

        assert_eq!(us_cart.id(), eu_cart.id());
    }
}
