//! `StoreError` → HTTP response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{error, warn};

use crate::StoreError;

impl StoreError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_)
            | Self::InvalidAmount
            | Self::CouponNotFound
            | Self::CouponExhausted
            | Self::MinPurchaseNotMet(_)
            | Self::InvalidPaymentSignature
            | Self::PaymentAmountMismatch { .. }
            | Self::InvalidStatusTransition { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::DuplicateOrder(_) | Self::Conflict(_) => StatusCode::CONFLICT,
            Self::PaymentGateway(_) => StatusCode::BAD_GATEWAY,
            Self::Database(_) | Self::Migration(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Upstream and storage details stay in the logs.
    fn response_message(&self) -> String {
        match self {
            Self::PaymentGateway(_) => "Error creating payment order".to_string(),
            Self::Database(_) | Self::Migration(_) | Self::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            Self::PaymentGateway(detail) => error!(detail = %detail, "Payment gateway failure"),
            Self::InvalidPaymentSignature | Self::PaymentAmountMismatch { .. } | Self::DuplicateOrder(_) => warn!(error = %self, "Payment rejected"),
            _ if status.is_server_error() => error!(error = %self, "Request failed"),
            _ => {}
        }
        let body = json!({ "success": false, "message": self.response_message() });
        (status, Json(body)).into_response()
    }
}
