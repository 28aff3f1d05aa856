// src/errors.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mongodb::error::{ErrorKind, WriteFailure};
use serde_json::json;
use thiserror::Error;

const DUPLICATE_KEY: i32 = 11000;

/// True when a write was rejected by a unique index.
pub fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY,
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY,
        _ => false,
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("MongoDB error: {0}")]
    MongoDB(#[from] mongodb::error::Error),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Cache operation timed out")]
    CacheTimeout,

    #[error("Invalid ObjectId: {0}")]
    InvalidObjectId(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("User not found with this email address")]
    UserNotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Authentication error: {0}")]
    AuthError(String),

    // Password reset flow
    #[error("OTP has expired or was not requested")]
    OtpExpired,

    #[error("Invalid OTP")]
    InvalidOtp,

    #[error("Too many invalid OTP attempts, request a new code")]
    TooManyAttempts,

    #[error("Invalid or expired reset token")]
    InvalidResetToken,

    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    #[error("Email error: {0}")]
    EmailError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Service error: {0}")]
    ServiceError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::MongoDB(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Database error"),
            AppError::Cache(_) | AppError::CacheTimeout => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Cache error")
            }
            AppError::InvalidObjectId(_) => (StatusCode::BAD_REQUEST, "Invalid ID format"),
            AppError::NotFound(_) | AppError::UserNotFound => (StatusCode::NOT_FOUND, "Not found"),
            AppError::Conflict(_) => (StatusCode::BAD_REQUEST, "Duplicate entry"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "Bad request"),
            AppError::ValidationError(_) => (StatusCode::BAD_REQUEST, "Validation failed"),
            AppError::InvalidCredentials => (StatusCode::BAD_REQUEST, "Invalid credentials"),
            AppError::AuthError(_) => (StatusCode::UNAUTHORIZED, "Authentication failed"),
            AppError::OtpExpired => (StatusCode::BAD_REQUEST, "OTP expired"),
            AppError::InvalidOtp => (StatusCode::BAD_REQUEST, "Invalid OTP"),
            AppError::TooManyAttempts => (StatusCode::TOO_MANY_REQUESTS, "Too many attempts"),
            AppError::InvalidResetToken => (StatusCode::BAD_REQUEST, "Invalid reset token"),
            AppError::PasswordHash(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Password hashing error"),
            AppError::EmailError(_) => (StatusCode::BAD_GATEWAY, "Email error"),
            AppError::ConfigurationError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Configuration error")
            }
            AppError::ServiceError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Service error"),
        };

        // Infrastructure failures are reported generically, details go to the log.
        let message = if status.is_server_error() {
            tracing::error!("{}", self);
            error_message.to_string()
        } else {
            self.to_string()
        };

        let body = Json(json!({
            "error": error_message,
            "message": message,
            "success": false,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }));

        (status, body).into_response()
    }
}

impl From<mongodb::bson::oid::Error> for AppError {
    fn from(err: mongodb::bson::oid::Error) -> Self {
        AppError::InvalidObjectId(err.to_string())
    }
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        AppError::Cache(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        AppError::AuthError(err.to_string())
    }
}

impl From<mongodb::bson::ser::Error> for AppError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        AppError::ServiceError(format!("BSON conversion failed: {}", err))
    }
}

// Helper conversion functions
impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        AppError::BadRequest(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        AppError::Conflict(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        AppError::ConfigurationError(msg.into())
    }

    pub fn email(msg: impl Into<String>) -> Self {
        AppError::EmailError(msg.into())
    }

    pub fn service(msg: impl Into<String>) -> Self {
        AppError::ServiceError(msg.into())
    }

    /// A unique-index violation becomes a 400 with `msg`, anything else stays a database error.
    pub fn duplicate_as_conflict(err: mongodb::error::Error, msg: &str) -> Self {
        if is_duplicate_key(&err) {
            AppError::conflict(msg)
        } else {
            AppError::MongoDB(err)
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn reset_flow_errors_map_to_client_statuses() {
        assert_eq!(status_of(AppError::UserNotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_of(AppError::OtpExpired), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(AppError::InvalidOtp), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(AppError::TooManyAttempts), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(status_of(AppError::InvalidResetToken), StatusCode::BAD_REQUEST);
    }

    fn write_error(code: i32) -> mongodb::error::Error {
        let write_error: mongodb::error::WriteError = mongodb::bson::from_document(
            mongodb::bson::doc! { "code": code, "errmsg": "E11000 duplicate key error" },
        )
        .unwrap();
        ErrorKind::Write(WriteFailure::WriteError(write_error)).into()
    }

    #[test]
    fn unique_index_violations_become_conflicts() {
        let err = AppError::duplicate_as_conflict(write_error(11000), "Email already in use");
        assert!(matches!(&err, AppError::Conflict(msg) if msg == "Email already in use"));
        assert_eq!(status_of(err), StatusCode::BAD_REQUEST);

        let other = AppError::duplicate_as_conflict(write_error(121), "Email already in use");
        assert!(matches!(other, AppError::MongoDB(_)));
    }

    #[test]
    fn infrastructure_errors_are_internal() {
        assert_eq!(status_of(AppError::CacheTimeout), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            status_of(AppError::Cache("connection refused".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(status_of(AppError::AuthError("bad".into())), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn server_errors_hide_details_from_the_body() {
        let response = AppError::Cache("redis://secret-host refused".into()).into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Cache error");
    }
}
