//! Cart endpoints.
//!
//! Every handler resolves the request's cart through the cart driver and
//! flushes the driver's queued cookies onto the response, so the cart id
//! round-trips transparently.

use std::collections::HashMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use chrono::Utc;
use domain::{Address, Order, ProductId};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::request::{request_context, with_cookies};
use crate::state::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct AddItemRequest {
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct ApplyCouponRequest {
    pub code: String,
}

#[derive(Deserialize)]
pub struct AddressesRequest {
    pub billing: Address,
    pub shipping: Option<Address>,
}

// -- Response types --

#[derive(Serialize)]
pub struct CartResponse {
    pub id: String,
    pub status: String,
    pub payment_status: String,
    pub items: Vec<LineItemResponse>,
    pub coupon: Option<String>,
    pub gateway: Option<String>,
    pub totals: TotalsResponse,
}

#[derive(Serialize)]
pub struct LineItemResponse {
    pub product_id: String,
    pub quantity: u32,
    pub unit_total_cents: i64,
    pub total_cents: i64,
}

#[derive(Serialize)]
pub struct TotalsResponse {
    pub items_total_cents: i64,
    pub coupon_total_cents: i64,
    pub shipping_total_cents: i64,
    pub tax_total_cents: i64,
    pub grand_total_cents: i64,
}

impl CartResponse {
    pub fn from_order(order: &Order) -> Self {
        let totals = order.totals();
        Self {
            id: order.id().to_string(),
            status: order.status().as_str().to_string(),
            payment_status: order.payment_status().as_str().to_string(),
            items: order
                .line_items()
                .iter()
                .map(|item| LineItemResponse {
                    product_id: item.product_id.to_string(),
                    quantity: item.quantity,
                    unit_total_cents: item.unit_total.cents(),
                    total_cents: item.total().cents(),
                })
                .collect(),
            coupon: order.coupon().map(|c| c.code.clone()),
            gateway: order.gateway().map(|g| g.provider_id.clone()),
            totals: TotalsResponse {
                items_total_cents: totals.items_total.cents(),
                coupon_total_cents: totals.coupon_total.cents(),
                shipping_total_cents: totals.shipping_total.cents(),
                tax_total_cents: totals.tax_total.cents(),
                grand_total_cents: totals.grand_total.cents(),
            },
        }
    }
}

// -- Handlers --

/// GET /cart — returns the request's cart, creating one when none exists.
pub async fn get(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let mut ctx = request_context(&headers, &query);
    let order = state.cart_driver.resolve(&mut ctx).await?;
    Ok(with_cookies(&ctx, Json(CartResponse::from_order(&order))))
}

/// POST /cart/items — adds a product to the cart at its current price.
#[tracing::instrument(skip_all)]
pub async fn add_item(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(req): Json<AddItemRequest>,
) -> Result<Response, ApiError> {
    let mut ctx = request_context(&headers, &query);
    let mut order = state.cart_driver.resolve(&mut ctx).await?;

    let product_id = ProductId::new(req.product_id);
    let product = state.products.find(&product_id).await?;
    if product.stock < i64::from(req.quantity) {
        return Err(ApiError::Conflict(format!(
            "Insufficient stock for {}: {} available",
            product.id, product.stock
        )));
    }

    order.add_line_item(product.id, req.quantity, product.price)?;
    state.orders.save(&mut order).await?;

    Ok(with_cookies(&ctx, Json(CartResponse::from_order(&order))))
}

/// PATCH /cart/items/{product_id} — updates a line item's quantity.
/// Quantity zero removes the line.
pub async fn update_item(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(req): Json<UpdateItemRequest>,
) -> Result<Response, ApiError> {
    let mut ctx = request_context(&headers, &query);
    let mut order = active_cart(&state, &mut ctx).await?;

    order.update_quantity(&ProductId::new(product_id), req.quantity)?;
    state.orders.save(&mut order).await?;

    Ok(with_cookies(&ctx, Json(CartResponse::from_order(&order))))
}

/// DELETE /cart/items/{product_id} — removes a line item.
pub async fn remove_item(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let mut ctx = request_context(&headers, &query);
    let mut order = active_cart(&state, &mut ctx).await?;

    order.remove_line_item(&ProductId::new(product_id))?;
    state.orders.save(&mut order).await?;

    Ok(with_cookies(&ctx, Json(CartResponse::from_order(&order))))
}

/// POST /cart/coupon — applies a coupon to the cart.
#[tracing::instrument(skip_all)]
pub async fn apply_coupon(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(req): Json<ApplyCouponRequest>,
) -> Result<Response, ApiError> {
    let mut ctx = request_context(&headers, &query);
    let mut order = active_cart(&state, &mut ctx).await?;

    let coupon = state.coupons.find(&req.code).await?;
    order.apply_coupon(coupon, Utc::now())?;
    state.orders.save(&mut order).await?;

    Ok(with_cookies(&ctx, Json(CartResponse::from_order(&order))))
}

/// DELETE /cart/coupon — removes the applied coupon.
pub async fn remove_coupon(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let mut ctx = request_context(&headers, &query);
    let mut order = active_cart(&state, &mut ctx).await?;

    order.remove_coupon()?;
    state.orders.save(&mut order).await?;

    Ok(with_cookies(&ctx, Json(CartResponse::from_order(&order))))
}

/// PUT /cart/addresses — sets billing (and optionally shipping)
/// addresses, resolving the shipping and tax quotes.
pub async fn set_addresses(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(req): Json<AddressesRequest>,
) -> Result<Response, ApiError> {
    let mut ctx = request_context(&headers, &query);
    let mut order = active_cart(&state, &mut ctx).await?;

    order.set_billing_address(Some(req.billing))?;
    order.set_shipping_address(req.shipping)?;
    order.set_quotes(state.shipping_quote, state.tax_quote);
    state.orders.save(&mut order).await?;

    Ok(with_cookies(&ctx, Json(CartResponse::from_order(&order))))
}

/// Returns the request's existing cart, or 404 when it has none.
pub(crate) async fn active_cart(
    state: &AppState,
    ctx: &mut cart::RequestContext,
) -> Result<Order, ApiError> {
    state
        .cart_driver
        .current(ctx)
        .await?
        .ok_or_else(|| ApiError::NotFound("No active cart".to_string()))
}
