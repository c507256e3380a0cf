//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid setting {name}: {value}")]
    InvalidSetting { name: &'static str, value: String },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Malformed client input. Carries the status it is reported with (422 or 400).
    #[error("{message}")]
    BadRequest { message: String, status: StatusCode },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("internal: {0}")]
    Internal(String),
}

impl AppError {
    /// 422 with the `Invalid <field>: <value>` message used by the query normalizers.
    pub fn invalid(field: &str, value: impl std::fmt::Display) -> Self {
        AppError::BadRequest {
            message: format!("Invalid {}: {}", field, value),
            status: StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    /// 400 for a missing or contradictory request parameter.
    pub fn missing(message: impl Into<String>) -> Self {
        AppError::BadRequest {
            message: message.into(),
            status: StatusCode::BAD_REQUEST,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest { status, .. } => *status,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Config(_) | AppError::Db(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::BadRequest { message, .. } => {
                tracing::warn!(status = %status, "{}", message);
                message.clone()
            }
            AppError::NotFound(what) => {
                tracing::debug!("not found: {}", what);
                "Not found".to_string()
            }
            AppError::Unauthorized(m) | AppError::Forbidden(m) => m.clone(),
            AppError::Config(_) | AppError::Db(_) | AppError::Internal(_) => {
                tracing::error!(error = %self, "request failed");
                "Internal server error".to_string()
            }
        };
        (status, Json(ErrorBody { message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_builds_422_message() {
        let err = AppError::invalid("start", "-1");
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.to_string(), "Invalid start: -1");
    }

    #[test]
    fn storage_errors_map_to_500() {
        let err = AppError::Db(sqlx::Error::PoolTimedOut);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let err = AppError::Internal("boom".into());
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
