//! Repository traits the core depends on.
//!
//! Each entity type is owned by its own repository; orders reference
//! products, customers, and coupons by id only.

use async_trait::async_trait;
use common::OrderId;
use domain::{Coupon, Customer, CustomerId, Order, Product, ProductId};

use crate::error::Result;

/// Storage for orders (and carts, which are orders in `Cart` status).
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Loads an order by id, or `StoreError::OrderNotFound`.
    async fn find(&self, id: OrderId) -> Result<Order>;

    /// Saves an order, enforcing optimistic concurrency: the order's
    /// version must match the stored version, and is bumped on success.
    async fn save(&self, order: &mut Order) -> Result<()>;

    /// Deletes an order. Orders are destroyed only by explicit deletion.
    async fn delete(&self, id: OrderId) -> Result<()>;
}

/// Storage for products, including atomic stock adjustment.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Loads a product by id, or `StoreError::ProductNotFound`.
    async fn find(&self, id: &ProductId) -> Result<Product>;

    /// Saves a product.
    async fn save(&self, product: &Product) -> Result<()>;

    /// Adjusts the stock count by `delta` (negative to decrement) and
    /// returns the new count. The read-modify-write is atomic relative to
    /// concurrent adjustments; driving the count below zero fails with
    /// `StoreError::InsufficientStock` and leaves it unchanged.
    async fn adjust_stock(&self, id: &ProductId, delta: i64) -> Result<i64>;
}

/// Storage for customers.
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// Loads a customer by id, or `StoreError::CustomerNotFound`.
    async fn find(&self, id: CustomerId) -> Result<Customer>;

    /// Loads a customer by email, if one exists.
    async fn find_by_email(&self, email: &str) -> Result<Option<Customer>>;

    /// Saves a customer.
    async fn save(&self, customer: &Customer) -> Result<()>;
}

/// Storage for coupons, keyed by code.
#[async_trait]
pub trait CouponRepository: Send + Sync {
    /// Loads a coupon by code, or `StoreError::CouponNotFound`.
    async fn find(&self, code: &str) -> Result<Coupon>;

    /// Saves a coupon.
    async fn save(&self, coupon: &Coupon) -> Result<()>;
}
