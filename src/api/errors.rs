use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;

use crate::domain::order::{OrderError, OrderStatus};
use crate::utils::IsTransient;

/// JSON error payload. Policy violations carry both statuses.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
    pub retryable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_status: Option<OrderStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_status: Option<OrderStatus>,
}

impl From<&OrderError> for ErrorBody {
    fn from(error: &OrderError) -> Self {
        let (current_status, requested_status) = match error {
            OrderError::InvalidTransition { from, to, .. } => (Some(*from), Some(*to)),
            OrderError::InvalidState { current, action, .. } => (Some(*current), action.target_status()),
            _ => (None, None),
        };

        Self {
            error: error.kind(),
            message: error.to_string(),
            retryable: error.is_transient(),
            current_status,
            requested_status,
        }
    }
}

impl ResponseError for OrderError {
    fn status_code(&self) -> StatusCode {
        match self {
            OrderError::NotFound { .. } => StatusCode::NOT_FOUND,
            OrderError::InvalidTransition { .. }
            | OrderError::InvalidState { .. }
            | OrderError::DeliveryUnavailable { .. }
            | OrderError::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            OrderError::TransientStoreConflict { .. } => StatusCode::SERVICE_UNAVAILABLE,
            OrderError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            OrderError::RouteUnavailable(_) => StatusCode::BAD_GATEWAY,
            OrderError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            tracing::error!(error = %self, "Order request failed");
        }
        HttpResponse::build(self.status_code()).json(ErrorBody::from(self))
    }
}
