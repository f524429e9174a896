//! Product entity.

use serde::{Deserialize, Serialize};

use crate::order::{Money, ProductId};

/// A purchasable product with a live price and stock count.
///
/// Orders never read the live price after an item has been added; line
/// items carry their own captured unit total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,

    /// Current unit price in minor units.
    pub price: Money,

    /// Units currently in stock.
    pub stock: i64,
}

impl Product {
    /// Creates a new product.
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>, price: Money, stock: i64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            stock,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization_roundtrip() {
        let product = Product::new("SKU-001", "Widget", Money::from_cents(1500), 10);
        let json = serde_json::to_string(&product).unwrap();
        let back: Product = serde_json::from_str(&json).unwrap();
        assert_eq!(back, product);
    }
}
