//! Request-level errors for the storefront API.
//!
//! Handlers return [`Result<T>`]. Client mistakes map to 4xx responses with
//! a JSON `{"error": "..."}` body; server faults are reported to Sentry and
//! answered with a generic 500 so no internals leak.
//!
//! Cart persistence failures never appear here. The cart store absorbs them
//! and keeps serving its in-memory state.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use barbaro_core::ProductId;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Session could not be read or written.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Product ID is not in the catalog.
    #[error("Unknown product: {0}")]
    UnknownProduct(ProductId),

    /// Product has a stock ceiling of zero.
    #[error("Product is out of stock: {0}")]
    OutOfStock(ProductId),

    /// Requested quantity is not acceptable for this operation.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    /// Background cart task panicked or was cancelled.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(format!("cart task failed: {err}"))
    }
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::UnknownProduct(_) => StatusCode::NOT_FOUND,
            Self::OutOfStock(_) => StatusCode::CONFLICT,
            Self::InvalidQuantity(_) => StatusCode::BAD_REQUEST,
        }
    }

    const fn is_server_error(&self) -> bool {
        matches!(self, Self::Session(_) | Self::Internal(_))
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
            "Internal server error".to_string()
        } else {
            tracing::debug!(error = %self, "Rejected request");
            self.to_string()
        };

        (self.status(), Json(ErrorBody { error: message })).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Record a cart action as a Sentry breadcrumb.
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added item", Some(&[("product_id", "whey-1kg")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data.unwrap_or_default() {
        breadcrumb.data.insert(
            (*key).to_string(),
            serde_json::Value::String((*value).to_string()),
        );
    }

    sentry::add_breadcrumb(breadcrumb);
}
