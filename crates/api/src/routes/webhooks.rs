//! Provider webhook endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use serde_json::Value;

use crate::error::ApiError;
use crate::state::AppState;

/// POST /webhooks/{provider} — hands a provider notification to the
/// matching gateway.
///
/// Verification, order-reference extraction, and the state transition
/// all live in the gateway; this handler only routes. Rejections map to
/// non-2xx statuses so the provider retries delivery.
#[tracing::instrument(skip(state, payload))]
pub async fn handle(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
    Json(payload): Json<Value>,
) -> Result<Json<gateway::WebhookAck>, ApiError> {
    let gw = state.gateways.get(&provider)?;
    let ack = gw.webhook(&payload).await?;
    Ok(Json(ack))
}
