//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use cart::CartError;
use domain::{CouponError, OrderError};
use gateway::GatewayError;
use store::StoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Request conflicts with the current state of the resource.
    Conflict(String),
    /// Gateway operation error.
    Gateway(GatewayError),
    /// Order aggregate error.
    Order(OrderError),
    /// Record store error.
    Store(StoreError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Field-level validation failures carry structure the client
        // renders per field; everything else is a plain message.
        if let ApiError::Gateway(GatewayError::Validation(errors)) = self {
            let body = serde_json::json!({
                "error": "Checkout validation failed",
                "fields": errors,
            });
            return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(body)).into_response();
        }

        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Gateway(err) => gateway_error_to_response(err),
            ApiError::Order(err) => order_error_to_response(&err),
            ApiError::Store(err) => store_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn gateway_error_to_response(err: GatewayError) -> (StatusCode, String) {
    match &err {
        // Unsupported operations surface as conflicts so clients can
        // tell "this provider cannot do that" from a malformed request.
        GatewayError::NotImplemented { .. } => (StatusCode::CONFLICT, err.to_string()),
        GatewayError::UnknownProvider(_) => (StatusCode::NOT_FOUND, err.to_string()),
        GatewayError::NoGatewaySelected(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        GatewayError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
        GatewayError::CaptureFailed { .. } => (StatusCode::PAYMENT_REQUIRED, err.to_string()),
        GatewayError::WebhookRejected { .. } | GatewayError::MissingOrderReference => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        GatewayError::Order(order_err) => order_error_to_response(order_err),
        GatewayError::Store(_) | GatewayError::Serialization(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

fn order_error_to_response(err: &OrderError) -> (StatusCode, String) {
    match err {
        OrderError::InvalidStatusTransition { .. }
        | OrderError::InvalidPaymentTransition { .. }
        | OrderError::RefundExceedsBalance { .. } => (StatusCode::CONFLICT, err.to_string()),
        OrderError::ItemNotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        OrderError::InvalidQuantity { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
        OrderError::Coupon(coupon_err) => coupon_error_to_response(coupon_err),
    }
}

fn coupon_error_to_response(err: &CouponError) -> (StatusCode, String) {
    match err {
        CouponError::InvalidCouponKind { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
        _ => (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
    }
}

fn store_error_to_response(err: StoreError) -> (StatusCode, String) {
    match &err {
        StoreError::OrderNotFound(_)
        | StoreError::ProductNotFound(_)
        | StoreError::CustomerNotFound(_)
        | StoreError::CouponNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        StoreError::VersionConflict { .. } | StoreError::InsufficientStock { .. } => {
            (StatusCode::CONFLICT, err.to_string())
        }
        StoreError::Serialization(_) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Store(e) => ApiError::Store(e),
            GatewayError::Order(e) => ApiError::Order(e),
            other => ApiError::Gateway(other),
        }
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        ApiError::Order(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}

impl From<CartError> for ApiError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::Store(e) => ApiError::Store(e),
            CartError::Order(e) => ApiError::Order(e),
        }
    }
}
