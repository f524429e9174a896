//! Per-request state the cart driver reads and writes.
//!
//! The context is framework-agnostic: the HTTP layer fills it from the
//! incoming request and drains the queued cookies into the response.

use std::collections::HashMap;

use common::OrderId;

/// An outbound cookie queued during request handling.
///
/// `value: None` instructs the HTTP layer to expire the cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedCookie {
    pub name: String,
    pub value: Option<String>,
}

/// Request-scoped inputs and outputs for cart resolution.
#[derive(Debug, Default)]
pub struct RequestContext {
    /// Cookies sent by the client.
    cookies: HashMap<String, String>,

    /// Query parameters of the request URL.
    query: HashMap<String, String>,

    /// Host of the request URL.
    host: Option<String>,

    /// Host of the `Referer` header, if any.
    referer_host: Option<String>,

    /// Cart ids already resolved during this request, keyed by cookie
    /// name. Keeps repeat lookups within one request on the same cart
    /// even before any response cookie has round-tripped.
    blink: HashMap<String, OrderId>,

    /// Cookies to set (or expire) on the response.
    queued: Vec<QueuedCookie>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_referer_host(mut self, host: impl Into<String>) -> Self {
        self.referer_host = Some(host.into());
        self
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn referer_host(&self) -> Option<&str> {
        self.referer_host.as_deref()
    }

    pub fn blink_get(&self, key: &str) -> Option<OrderId> {
        self.blink.get(key).copied()
    }

    pub fn blink_set(&mut self, key: impl Into<String>, id: OrderId) {
        self.blink.insert(key.into(), id);
    }

    pub fn blink_forget(&mut self, key: &str) {
        self.blink.remove(key);
    }

    /// Queues a cookie for the response. A later queue for the same name
    /// wins.
    pub fn queue_cookie(&mut self, name: impl Into<String>, value: Option<String>) {
        let name = name.into();
        self.queued.retain(|c| c.name != name);
        self.queued.push(QueuedCookie { name, value });
    }

    /// Cookies the response must carry.
    pub fn queued_cookies(&self) -> &[QueuedCookie] {
        &self.queued
    }
}
