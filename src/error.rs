use crate::adapters::database::masking::mask_secret;
use crate::adapters::database::retry::Transient;
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Seconds a client is asked to wait after the database was unavailable.
const RETRY_AFTER_SECS: &str = "5";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    /// Login with an unknown email, a wrong password, or an inactive account.
    #[error("Invalid email or password")]
    InvalidCredentials,
    /// Missing, malformed, or expired bearer token.
    #[error("Missing or invalid access token")]
    Unauthorized,
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Internal server error")]
    Internal,
}

pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Database(e) if e.is_transient() => {
                tracing::warn!(error = %mask_secret_in(&e), "Database unavailable");
                (StatusCode::SERVICE_UNAVAILABLE, "The database is temporarily unavailable. Please try again shortly.")
            }
            Self::Database(e) => {
                tracing::error!(error = %mask_secret_in(&e), "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong on our side. Please try again later.")
            }
            Self::InvalidCredentials => {
                tracing::debug!("Login rejected");
                (StatusCode::UNAUTHORIZED, "Invalid email or password")
            }
            Self::Unauthorized => {
                tracing::debug!("Bearer token rejected");
                (StatusCode::UNAUTHORIZED, "Please log in to continue")
            }
            Self::BadRequest(msg) => {
                tracing::debug!(message = %msg, "Bad request");
                return error_response(StatusCode::BAD_REQUEST, &msg);
            }
            Self::Conflict(msg) => {
                tracing::debug!(message = %msg, "Conflict");
                return error_response(StatusCode::CONFLICT, &msg);
            }
            Self::Internal => {
                tracing::error!("Internal server error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong on our side. Please try again later.")
            }
        };

        error_response(status, message)
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    let mut response = (status, Json(json!({ "error": message }))).into_response();
    if status == StatusCode::SERVICE_UNAVAILABLE {
        response.headers_mut().insert(header::RETRY_AFTER, HeaderValue::from_static(RETRY_AFTER_SECS));
    }
    response
}

/// Driver errors can quote the connection URL.
fn mask_secret_in(error: &sqlx::Error) -> String {
    let message = error.to_string();
    if message.contains("://") { mask_secret(&message) } else { message }
}
