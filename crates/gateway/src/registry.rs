//! Provider registry.
//!
//! Orders store only a provider identifier plus an opaque data blob; this
//! registry is the explicit mapping from identifier to implementation.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{GatewayError, Result};
use crate::protocol::Gateway;

/// Maps provider identifiers to gateway implementations.
#[derive(Clone, Default)]
pub struct GatewayRegistry {
    gateways: HashMap<String, Arc<dyn Gateway>>,
}

impl GatewayRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a gateway under its own name. Re-registering a name
    /// replaces the previous implementation.
    pub fn register(&mut self, gateway: Arc<dyn Gateway>) {
        self.gateways.insert(gateway.name().to_string(), gateway);
    }

    /// Resolves a provider identifier.
    pub fn get(&self, provider_id: &str) -> Result<Arc<dyn Gateway>> {
        self.gateways
            .get(provider_id)
            .cloned()
            .ok_or_else(|| GatewayError::UnknownProvider(provider_id.to_string()))
    }

    /// Returns the registered provider identifiers.
    pub fn provider_ids(&self) -> Vec<&str> {
        self.gateways.keys().map(String::as_str).collect()
    }
}
