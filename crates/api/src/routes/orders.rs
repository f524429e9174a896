//! Placed-order endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::OrderId;
use domain::{Money, Order, StatusEntry};
use gateway::GatewayError;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::routes::cart::CartResponse;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct RefundRequest {
    /// Amount to refund in minor units. Omitted means a full refund
    /// through the order's gateway.
    pub amount_cents: Option<i64>,
}

#[derive(Serialize)]
pub struct OrderResponse {
    #[serde(flatten)]
    pub order: CartResponse,
    pub status_log: Vec<StatusEntry>,
    pub receipt: String,
}

impl OrderResponse {
    fn from_order(order: &Order) -> Self {
        Self {
            order: CartResponse::from_order(order),
            status_log: order.status_log().entries().to_vec(),
            receipt: order.receipt(),
        }
    }
}

/// GET /orders/{id} — returns an order with its transition history.
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state.orders.find(order_id).await?;
    Ok(Json(OrderResponse::from_order(&order)))
}

/// POST /orders/{id}/refund — refunds a paid order.
///
/// Without an amount the outstanding balance is refunded through the
/// order's gateway; with one, a partial refund is recorded directly.
#[tracing::instrument(skip_all, fields(order_id = %id))]
pub async fn refund(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<RefundRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state.orders.find(order_id).await?;

    let selection = order
        .gateway()
        .ok_or(GatewayError::NoGatewaySelected(order_id))
        .map_err(ApiError::from)?;
    let gw = state.gateways.get(&selection.provider_id)?;

    match req.amount_cents {
        Some(cents) => {
            state
                .processor
                .refund(order_id, Money::from_cents(cents), gw.name())
                .await?;
        }
        None => {
            gw.refund(&order).await?;
        }
    }

    let order = state.orders.find(order_id).await?;
    Ok(Json(OrderResponse::from_order(&order)))
}

fn parse_order_id(raw: &str) -> Result<OrderId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid order id: {raw}")))
}
