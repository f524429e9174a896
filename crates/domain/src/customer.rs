//! Customer entity.

use std::collections::HashMap;

use common::OrderId;
use serde::{Deserialize, Serialize};

use crate::order::CustomerId;

/// A customer known to the store.
///
/// Holds a weak, lookup-only list of order ids. Customers never own
/// orders; the order repository does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub email: String,

    /// Arbitrary customer data (names, marketing preferences, ...).
    #[serde(default)]
    pub data: HashMap<String, serde_json::Value>,

    /// Ids of orders this customer has placed.
    #[serde(default)]
    pub order_ids: Vec<OrderId>,
}

impl Customer {
    /// Creates a new customer with the given email.
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            id: CustomerId::new(),
            email: email.into(),
            data: HashMap::new(),
            order_ids: Vec::new(),
        }
    }

    /// Returns the customer's display name.
    ///
    /// Prefers `first_name` + `last_name` from the data map, falling back
    /// to a plain `name` key.
    pub fn name(&self) -> Option<String> {
        let get = |key: &str| self.data.get(key).and_then(|v| v.as_str());

        if let (Some(first), Some(last)) = (get("first_name"), get("last_name")) {
            return Some(format!("{first} {last}"));
        }

        get("name").map(str::to_string)
    }

    /// Records an order id against this customer, once.
    pub fn link_order(&mut self, order_id: OrderId) {
        if !self.order_ids.contains(&order_id) {
            self.order_ids.push(order_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_prefers_split_fields() {
        let mut customer = Customer::new("ada@example.com");
        customer
            .data
            .insert("name".into(), serde_json::json!("A. Lovelace"));
        assert_eq!(customer.name().as_deref(), Some("A. Lovelace"));

        customer
            .data
            .insert("first_name".into(), serde_json::json!("Ada"));
        customer
            .data
            .insert("last_name".into(), serde_json::json!("Lovelace"));
        assert_eq!(customer.name().as_deref(), Some("Ada Lovelace"));
    }

    #[test]
    fn test_name_missing() {
        let customer = Customer::new("ada@example.com");
        assert_eq!(customer.name(), None);
    }

    #[test]
    fn test_link_order_is_idempotent() {
        let mut customer = Customer::new("ada@example.com");
        let order_id = OrderId::new();
        customer.link_order(order_id);
        customer.link_order(order_id);
        assert_eq!(customer.order_ids.len(), 1);
    }
}
