//! Site configuration and request-to-site resolution.

use serde::Deserialize;

use crate::context::RequestContext;

/// A single storefront.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Site {
    /// Stable handle used in cookie keys and the `site` query parameter.
    pub handle: String,

    /// Hostname the storefront is served from.
    pub host: String,
}

/// The set of storefronts a deployment serves.
#[derive(Debug, Clone, Deserialize)]
pub struct Sites {
    sites: Vec<Site>,

    /// Handle used when nothing on the request identifies a site.
    default_handle: String,

    /// When true, all sites share one cart and cookie keys are not
    /// scoped per site.
    single_cart: bool,
}

impl Sites {
    pub fn new(sites: Vec<Site>, default_handle: impl Into<String>, single_cart: bool) -> Self {
        Self {
            sites,
            default_handle: default_handle.into(),
            single_cart,
        }
    }

    /// A deployment with one implicit storefront.
    pub fn single(handle: impl Into<String>) -> Self {
        let handle = handle.into();
        Self {
            sites: Vec::new(),
            default_handle: handle,
            single_cart: true,
        }
    }

    pub fn is_multi_site(&self) -> bool {
        self.sites.len() > 1
    }

    pub fn single_cart(&self) -> bool {
        self.single_cart
    }

    /// Resolves the site a request belongs to.
    ///
    /// Precedence: explicit `site` query parameter, then the request URL
    /// host, then the referer host, then the configured default. An
    /// unknown handle or host falls through to the next source.
    pub fn resolve(&self, ctx: &RequestContext) -> &str {
        if let Some(handle) = ctx.query_param("site")
            && let Some(site) = self.sites.iter().find(|s| s.handle == handle)
        {
            return &site.handle;
        }

        if let Some(host) = ctx.host()
            && let Some(site) = self.sites.iter().find(|s| s.host == host)
        {
            return &site.handle;
        }

        if let Some(host) = ctx.referer_host()
            && let Some(site) = self.sites.iter().find(|s| s.host == host)
        {
            return &site.handle;
        }

        &self.default_handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sites() -> Sites {
        Sites::new(
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
        )
    }

    #[test]
    fn test_query_param_takes_precedence() {
        let ctx = RequestContext::new()
            .with_query("site", "eu")
            .with_host("shop.example.com");
        assert_eq!(sites().resolve(&ctx), "eu");
    }

    #[test]
    fn test_unknown_query_param_falls_through_to_host() {
        let ctx = RequestContext::new()
            .with_query("site", "apac")
            .with_host("shop.example.eu");
        assert_eq!(sites().resolve(&ctx), "eu");
    }

    #[test]
    fn test_referer_host_is_used_when_request_host_is_unknown() {
        let ctx = RequestContext::new()
            .with_host("api.example.com")
            .with_referer_host("shop.example.eu");
        assert_eq!(sites().resolve(&ctx), "eu");
    }

    #[test]
    fn test_bare_request_resolves_to_default() {
        let ctx = RequestContext::new();
        assert_eq!(sites().resolve(&ctx), "us");
    }
}
