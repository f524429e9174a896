//! In-memory repository implementations.
//!
//! These back the test suites and the default server wiring, and provide
//! the same contract a database-backed implementation would.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::OrderId;
use domain::{Coupon, Customer, CustomerId, Order, Product, ProductId};
use tokio::sync::RwLock;

use crate::error::{Result, StoreError};
use crate::repository::{
    CouponRepository, CustomerRepository, OrderRepository, ProductRepository,
};

/// In-memory order store with optimistic version checks.
#[derive(Clone, Default)]
pub struct InMemoryOrders {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl InMemoryOrders {
    /// Creates a new empty order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored orders.
    pub async fn count(&self) -> usize {
        self.orders.read().await.len()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrders {
    async fn find(&self, id: OrderId) -> Result<Order> {
        self.orders
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::OrderNotFound(id))
    }

    async fn save(&self, order: &mut Order) -> Result<()> {
        let mut orders = self.orders.write().await;

        if let Some(stored) = orders.get(&order.id())
            && stored.version() != order.version()
        {
            return Err(StoreError::VersionConflict {
                order_id: order.id(),
                expected: order.version(),
                actual: stored.version(),
            });
        }

        order.set_version(order.version() + 1);
        orders.insert(order.id(), order.clone());
        Ok(())
    }

    async fn delete(&self, id: OrderId) -> Result<()> {
        self.orders
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::OrderNotFound(id))
    }
}

/// In-memory product store with atomic stock adjustment.
#[derive(Clone, Default)]
pub struct InMemoryProducts {
    products: Arc<RwLock<HashMap<ProductId, Product>>>,
}

impl InMemoryProducts {
    /// Creates a new empty product store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current stock count for a product.
    pub async fn stock(&self, id: &ProductId) -> Result<i64> {
        Ok(self
            .products
            .read()
            .await
            .get(id)
            .ok_or_else(|| StoreError::ProductNotFound(id.clone()))?
            .stock)
    }
}

#[async_trait]
impl ProductRepository for InMemoryProducts {
    async fn find(&self, id: &ProductId) -> Result<Product> {
        self.products
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::ProductNotFound(id.clone()))
    }

    async fn save(&self, product: &Product) -> Result<()> {
        self.products
            .write()
            .await
            .insert(product.id.clone(), product.clone());
        Ok(())
    }

    async fn adjust_stock(&self, id: &ProductId, delta: i64) -> Result<i64> {
        // The write lock makes the read-modify-write atomic.
        let mut products = self.products.write().await;
        let product = products
            .get_mut(id)
            .ok_or_else(|| StoreError::ProductNotFound(id.clone()))?;

        let new_stock = product.stock + delta;
        if new_stock < 0 {
            return Err(StoreError::InsufficientStock {
                product_id: id.clone(),
                available: product.stock,
                requested: -delta,
            });
        }

        product.stock = new_stock;
        Ok(new_stock)
    }
}

/// In-memory customer store.
#[derive(Clone, Default)]
pub struct InMemoryCustomers {
    customers: Arc<RwLock<HashMap<CustomerId, Customer>>>,
}

impl InMemoryCustomers {
    /// Creates a new empty customer store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CustomerRepository for InMemoryCustomers {
    async fn find(&self, id: CustomerId) -> Result<Customer> {
        self.customers
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::CustomerNotFound(id.to_string()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Customer>> {
        Ok(self
            .customers
            .read()
            .await
            .values()
            .find(|c| c.email == email)
            .cloned())
    }

    async fn save(&self, customer: &Customer) -> Result<()> {
        self.customers
            .write()
            .await
            .insert(customer.id, customer.clone());
        Ok(())
    }
}

/// In-memory coupon store keyed by code.
#[derive(Clone, Default)]
pub struct InMemoryCoupons {
    coupons: Arc<RwLock<HashMap<String, Coupon>>>,
}

impl InMemoryCoupons {
    /// Creates a new empty coupon store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CouponRepository for InMemoryCoupons {
    async fn find(&self, code: &str) -> Result<Coupon> {
        self.coupons
            .read()
            .await
            .get(code)
            .cloned()
            .ok_or_else(|| StoreError::CouponNotFound(code.to_string()))
    }

    async fn save(&self, coupon: &Coupon) -> Result<()> {
        self.coupons
            .write()
            .await
            .insert(coupon.code.clone(), coupon.clone());
        Ok(())
    }
}
