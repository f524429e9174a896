//! Glue between HTTP requests/responses and the cart's request context.

use std::collections::HashMap;

use axum::http::{HeaderMap, header};
use axum::response::{IntoResponse, Response};
use cart::RequestContext;

/// Builds a cart request context from the incoming request.
pub fn request_context(headers: &HeaderMap, query: &HashMap<String, String>) -> RequestContext {
    let mut ctx = RequestContext::new();

    if let Some(raw) = headers.get(header::COOKIE).and_then(|v| v.to_str().ok()) {
        for pair in raw.split(';') {
            if let Some((name, value)) = pair.trim().split_once('=') {
                ctx = ctx.with_cookie(name, value);
            }
        }
    }

    if let Some(host) = headers.get(header::HOST).and_then(|v| v.to_str().ok()) {
        // Strip any port; site hosts are configured without one.
        let host = host.split(':').next().unwrap_or(host);
        ctx = ctx.with_host(host);
    }

    if let Some(referer) = headers.get(header::REFERER).and_then(|v| v.to_str().ok())
        && let Some(host) = host_of(referer)
    {
        ctx = ctx.with_referer_host(host);
    }

    for (name, value) in query {
        ctx = ctx.with_query(name, value);
    }

    ctx
}

/// Extracts the host portion of an absolute URL.
fn host_of(url: &str) -> Option<&str> {
    let rest = url.split_once("://")?.1;
    let authority = rest.split(['/', '?', '#']).next()?;
    let host = authority.rsplit('@').next()?;
    Some(host.split(':').next().unwrap_or(host))
}

/// Attaches the context's queued cookies to a response as `Set-Cookie`
/// headers. A queued value of `None` expires the cookie.
pub fn with_cookies(ctx: &RequestContext, response: impl IntoResponse) -> Response {
    let mut response = response.into_response();

    for cookie in ctx.queued_cookies() {
        let header_value = match &cookie.value {
            Some(value) => format!("{}={value}; Path=/; HttpOnly; SameSite=Lax", cookie.name),
            None => format!("{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax", cookie.name),
        };
        if let Ok(value) = header_value.parse() {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }

    response
}
