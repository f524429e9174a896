//! Shared application state accessible from all handlers.

use std::sync::Arc;

use cart::CartDriver;
use domain::Money;
use gateway::{GatewayRegistry, PaymentProcessor};
use store::{CouponRepository, CustomerRepository, OrderRepository, ProductRepository};

pub struct AppState {
    pub orders: Arc<dyn OrderRepository>,
    pub products: Arc<dyn ProductRepository>,
    pub customers: Arc<dyn CustomerRepository>,
    pub coupons: Arc<dyn CouponRepository>,
    pub cart_driver: Arc<dyn CartDriver>,
    pub gateways: GatewayRegistry,
    pub processor: Arc<PaymentProcessor>,

    /// Flat shipping quote applied once addresses are known.
    pub shipping_quote: Money,

    /// Flat tax quote applied once addresses are known.
    pub tax_quote: Money,
}
