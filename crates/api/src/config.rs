//! Application configuration loaded from environment variables.

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `CART_COOKIE_KEY` — base name of the cart cookie (default: `"cart"`)
/// - `SHIPPING_CENTS` — flat shipping quote in minor units (default: `0`)
/// - `TAX_CENTS` — flat tax quote in minor units (default: `0`)
/// - `REFUND_RESTOCK` — put refunded items back into stock (default: `false`)
/// - `WEBHOOK_TOKEN` — shared secret for hosted-gateway webhooks
///   (default: `"dev-webhook-token"`)
/// - `HOSTED_PAGE_URL` — hosted payment page base URL
///   (default: `"https://pay.example.com/session"`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub cart_cookie_key: String,
    pub shipping_cents: i64,
    pub tax_cents: i64,
    pub refund_restock: bool,
    pub webhook_token: String,
    pub hosted_page_url: String,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            cart_cookie_key: std::env::var("CART_COOKIE_KEY").unwrap_or_else(|_| "cart".to_string()),
            shipping_cents: std::env::var("SHIPPING_CENTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            tax_cents: std::env::var("TAX_CENTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            refund_restock: std::env::var("REFUND_RESTOCK")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            webhook_token: std::env::var("WEBHOOK_TOKEN")
                .unwrap_or_else(|_| "dev-webhook-token".to_string()),
            hosted_page_url: std::env::var("HOSTED_PAGE_URL")
                .unwrap_or_else(|_| "https://pay.example.com/session".to_string()),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            cart_cookie_key: "cart".to_string(),
            shipping_cents: 0,
            tax_cents: 0,
            refund_restock: false,
            webhook_token: "dev-webhook-token".to_string(),
            hosted_page_url: "https://pay.example.com/session".to_string(),
        }
    }
}
