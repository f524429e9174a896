//! HTTP storefront API with observability for the commerce core.
//!
//! Exposes the cart, checkout, webhook, and order endpoints over in-memory
//! stores, with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod request;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, patch, post, put};
use cart::{CookieDriver, Sites};
use domain::Money;
use gateway::{DummyGateway, GatewayRegistry, HostedGateway, LogEventSink, PaymentProcessor, RefundPolicy};
use metrics_exporter_prometheus::PrometheusHandle;
use store::{InMemoryCoupons, InMemoryCustomers, InMemoryOrders, InMemoryProducts};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use state::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/cart", get(routes::cart::get))
        .route("/cart/items", post(routes::cart::add_item))
        .route("/cart/items/{product_id}", patch(routes::cart::update_item))
        .route("/cart/items/{product_id}", delete(routes::cart::remove_item))
        .route("/cart/coupon", post(routes::cart::apply_coupon))
        .route("/cart/coupon", delete(routes::cart::remove_coupon))
        .route("/cart/addresses", put(routes::cart::set_addresses))
        .route("/checkout/prepare", get(routes::checkout::prepare))
        .route("/checkout", post(routes::checkout::checkout))
        .route("/webhooks/{provider}", post(routes::webhooks::handle))
        .route("/orders/{id}", get(routes::orders::get))
        .route("/orders/{id}/refund", post(routes::orders::refund))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the default application state: in-memory stores, the built-in
/// gateways, and a cookie-backed cart driver.
pub fn create_default_state(config: &Config) -> Arc<AppState> {
    let orders = Arc::new(InMemoryOrders::new());
    let products = Arc::new(InMemoryProducts::new());
    let customers = Arc::new(InMemoryCustomers::new());
    let coupons = Arc::new(InMemoryCoupons::new());

    let processor = Arc::new(PaymentProcessor::new(
        orders.clone(),
        products.clone(),
        coupons.clone(),
        Arc::new(LogEventSink),
        RefundPolicy {
            restock: config.refund_restock,
        },
    ));

    let mut gateways = GatewayRegistry::new();
    gateways.register(Arc::new(DummyGateway::new(processor.clone())));
    gateways.register(Arc::new(HostedGateway::new(
        processor.clone(),
        config.webhook_token.clone(),
        config.hosted_page_url.clone(),
    )));

    let cart_driver = Arc::new(CookieDriver::new(
        orders.clone(),
        config.cart_cookie_key.clone(),
        Sites::single("default"),
    ));

    Arc::new(AppState {
        orders,
        products,
        customers,
        coupons,
        cart_driver,
        gateways,
        processor,
        shipping_quote: Money::from_cents(config.shipping_cents),
        tax_quote: Money::from_cents(config.tax_cents),
    })
}
