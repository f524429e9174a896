//! Checkout endpoints.

use std::collections::HashMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use domain::{Customer, GatewaySelection};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;
use crate::request::{request_context, with_cookies};
use crate::routes::cart::{CartResponse, active_cart};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CheckoutRequest {
    /// Provider identifier, as registered in the gateway registry.
    pub gateway: String,

    /// Buyer email; the order is linked to an existing or new customer.
    pub email: Option<String>,

    /// Provider-specific payment payload, validated against the
    /// gateway's checkout rules.
    #[serde(default)]
    pub payment: Value,
}

#[derive(Serialize)]
pub struct CheckoutResponse {
    pub receipt: gateway::Receipt,
    pub order: CartResponse,
}

/// GET /checkout/prepare?gateway={provider} — runs the provider's
/// client-side handshake for the cart (e.g. a redirect URL for offsite
/// providers) and records the gateway selection on the order.
pub async fn prepare(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let mut ctx = request_context(&headers, &query);
    let mut order = active_cart(&state, &mut ctx).await?;

    let provider = query
        .get("gateway")
        .ok_or_else(|| ApiError::BadRequest("Missing gateway parameter".to_string()))?;
    let gw = state.gateways.get(provider)?;

    let handshake = gw.prepare(&order).await?;

    order.select_gateway(GatewaySelection::new(gw.name()));
    state.orders.save(&mut order).await?;

    Ok(with_cookies(&ctx, Json(handshake)))
}

/// POST /checkout — captures payment for the cart through an onsite
/// gateway.
///
/// On success the cart cookie is expired; the placed order is no longer
/// anyone's cart. A provider decline leaves the cart intact so the buyer
/// can retry. Offsite providers reject this path with their uniform
/// not-implemented signal.
#[tracing::instrument(skip_all, fields(gateway = %req.gateway))]
pub async fn checkout(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(req): Json<CheckoutRequest>,
) -> Result<Response, ApiError> {
    let mut ctx = request_context(&headers, &query);
    let mut order = active_cart(&state, &mut ctx).await?;

    if !order.has_items() {
        return Err(ApiError::BadRequest("Cart is empty".to_string()));
    }

    let gw = state.gateways.get(&req.gateway)?;

    order.select_gateway(GatewaySelection::new(gw.name()));

    if let Some(email) = &req.email {
        let mut customer = match state.customers.find_by_email(email).await? {
            Some(existing) => existing,
            None => Customer::new(email),
        };
        customer.link_order(order.id());
        state.customers.save(&customer).await?;
        order.set_customer(customer.id);
    }

    state.orders.save(&mut order).await?;

    let receipt = gw.checkout(order.id(), &req.payment).await?;

    // The order left cart status; detach the cookie so the next request
    // starts a fresh cart.
    state.cart_driver.forget(&mut ctx);

    let order = state.orders.find(order.id()).await?;
    let response = CheckoutResponse {
        receipt,
        order: CartResponse::from_order(&order),
    };
    Ok(with_cookies(&ctx, Json(response)))
}
