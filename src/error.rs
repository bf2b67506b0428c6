// src/error.rs
use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde_json::json;

use crate::cart::CartError;
use crate::lifecycle::TransitionError;
use crate::upstream::UpstreamError;

#[derive(Debug)]
pub enum AppError {
    DatabaseError(sqlx::Error),
    NotFound(String),
    ValidationError(String),
    Conflict(String),
    Upstream { status: StatusCode, message: String },
    Internal(String),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::ValidationError(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    /// The message a view shows in its error banner.
    pub fn message(&self) -> String {
        match self {
            AppError::DatabaseError(_) => "Storage error occurred".to_string(),
            AppError::NotFound(msg)
            | AppError::ValidationError(msg)
            | AppError::Conflict(msg)
            | AppError::Internal(msg) => msg.clone(),
            AppError::Upstream { message, .. } => message.clone(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::DatabaseError(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Upstream { status, .. } => *status,
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message(), self.status())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::DatabaseError(ref e) = self {
            tracing::error!(error = %e, "Storage error");
        }

        let body = Json(json!({
            "error": self.message(),
        }));

        (self.status(), body).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::DatabaseError(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(format!("Serialization failed: {err}"))
    }
}

impl From<CartError> for AppError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::NotInCart(_) => AppError::NotFound(err.to_string()),
            _ => AppError::ValidationError(err.to_string()),
        }
    }
}

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        if err.is_state_conflict() {
            AppError::Conflict(err.to_string())
        } else {
            AppError::ValidationError(err.to_string())
        }
    }
}

impl From<UpstreamError> for AppError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::NotFound(what) => AppError::NotFound(format!("{what} not found")),
            UpstreamError::Rejected { status, message } => {
                // Client errors keep their status so the view can tell a bad
                // submission from an unreachable backend.
                let status = StatusCode::from_u16(status)
                    .ok()
                    .filter(|s| s.is_client_error())
                    .unwrap_or(StatusCode::BAD_GATEWAY);
                AppError::Upstream { status, message }
            }
            other => AppError::Upstream {
                status: StatusCode::BAD_GATEWAY,
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_client_errors_keep_their_status() {
        let err: AppError = UpstreamError::Rejected {
            status: 422,
            message: "Amount exceeds balance".into(),
        }
        .into();
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.message(), "Amount exceeds balance");
    }

    #[test]
    fn upstream_server_errors_become_bad_gateway() {
        let err: AppError = UpstreamError::Rejected {
            status: 500,
            message: "boom".into(),
        }
        .into();
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);

        let err: AppError = UpstreamError::Request("connection refused".into()).into();
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn cart_errors_map_to_client_statuses() {
        let err: AppError = CartError::NotInCart("FW-1".into()).into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err: AppError = CartError::ZeroQuantity.into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
