use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{
    clients::{sendgrid::EmailError, stripe::PaymentError},
    response::ApiResponse,
};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("{0}")]
    Conflict(String),

    #[error("Database error")]
    Db(#[from] sqlx::Error),

    #[error("Payment provider error")]
    Payment(#[from] PaymentError),

    #[error("Email provider error")]
    Email(#[from] EmailError),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Db(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Payment(_) | AppError::Email(_) => StatusCode::BAD_GATEWAY,
        };

        // Server-side failures keep their detail in the logs only.
        match &self {
            AppError::Db(err) => tracing::error!(error = %err, "database error"),
            AppError::Payment(err) => tracing::error!(error = %err, "payment provider error"),
            AppError::Email(err) => tracing::error!(error = %err, "email provider error"),
            AppError::Internal(err) => tracing::error!(error = %err, "internal error"),
            _ => {}
        }

        let body = ApiResponse::<()>::error(self.to_string());
        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
