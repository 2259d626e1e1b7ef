// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::clients::GatewayError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Account is inactive")]
    AccountInactive,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Missing permission '{0}'")]
    MissingPermission(String),

    #[error("User not found")]
    UserNotFound,

    #[error("Username already exists")]
    UsernameAlreadyExists,

    #[error("Phone number already exists")]
    PhoneAlreadyExists,

    #[error("Email already exists")]
    EmailAlreadyExists,

    #[error("Unique constraint violated: {0}")]
    UniqueConstraintViolation(String),

    /// A load-bearing call to a sibling service failed.
    #[error("{step} failed: {source}")]
    DependencyError {
        step: &'static str,
        #[source]
        source: GatewayError,
    },

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Bcrypt error: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn dependency(step: &'static str, source: GatewayError) -> Self {
        AppError::DependencyError { step, source }
    }

    /// Stable machine-readable code sent next to the message.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) | AppError::InvalidInput(_) => "validation_error",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::AccountInactive => "account_inactive",
            AppError::InvalidToken => "invalid_token",
            AppError::TokenExpired => "token_expired",
            AppError::MissingPermission(_) => "forbidden",
            AppError::UserNotFound => "not_found",
            AppError::UsernameAlreadyExists
            | AppError::PhoneAlreadyExists
            | AppError::EmailAlreadyExists
            | AppError::UniqueConstraintViolation(_) => "conflict",
            AppError::DependencyError { .. } => "service_unavailable",
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::InvalidToken | AppError::TokenExpired => {
                StatusCode::UNAUTHORIZED
            }
            AppError::AccountInactive | AppError::MissingPermission(_) => StatusCode::FORBIDDEN,
            AppError::UserNotFound => StatusCode::NOT_FOUND,
            AppError::UsernameAlreadyExists
            | AppError::PhoneAlreadyExists
            | AppError::EmailAlreadyExists
            | AppError::UniqueConstraintViolation(_) => StatusCode::CONFLICT,
            AppError::DependencyError { .. } => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn to_api_error(&self) -> ApiError {
        let status = self.status();
        let code = self.code();

        match self {
            AppError::ValidationError(errors) => {
                let mut details = serde_json::Map::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| match &e.message {
                            Some(m) => m.to_string(),
                            None => e.code.to_string(),
                        })
                        .collect();
                    details.insert(field.to_string(), json!(messages));
                }
                ApiError {
                    status,
                    code,
                    error: "One or more fields are invalid.".into(),
                    details: Some(Value::Object(details)),
                }
            }
            AppError::DependencyError { step, source } => {
                tracing::error!("🔥 Dependency failure at {}: {}", step, source);
                ApiError {
                    status,
                    code,
                    error: "A required upstream service is unavailable.".into(),
                    details: None,
                }
            }
            e if status == StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!("🔥 Internal server error: {}", e);
                ApiError {
                    status,
                    code,
                    error: "An unexpected error occurred.".into(),
                    details: None,
                }
            }
            e => ApiError {
                status,
                code,
                error: e.to_string(),
                details: None,
            },
        }
    }
}

/// The JSON error body every route answers with.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub error: String,
    pub details: Option<Value>,
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        err.to_api_error()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "error": self.error,
            "code": self.code,
        });
        if let Some(details) = self.details {
            body["details"] = details;
        }
        (self.status, Json(body)).into_response()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error().into_response()
    }
}

impl From<AppError> for tonic::Status {
    fn from(err: AppError) -> Self {
        let api = err.to_api_error();
        let message = match api.details {
            Some(details) => format!("{}: {}", api.error, details),
            None => api.error,
        };
        match err {
            AppError::ValidationError(_) | AppError::InvalidInput(_) => {
                tonic::Status::invalid_argument(message)
            }
            AppError::InvalidCredentials | AppError::InvalidToken | AppError::TokenExpired => {
                tonic::Status::unauthenticated(message)
            }
            AppError::AccountInactive | AppError::MissingPermission(_) => {
                tonic::Status::permission_denied(message)
            }
            AppError::UserNotFound => tonic::Status::not_found(message),
            AppError::UsernameAlreadyExists
            | AppError::PhoneAlreadyExists
            | AppError::EmailAlreadyExists
            | AppError::UniqueConstraintViolation(_) => tonic::Status::already_exists(message),
            AppError::DependencyError { .. } => tonic::Status::unavailable(message),
            _ => tonic::Status::internal(message),
        }
    }
}

/// Maps a unique-constraint violation to the matching conflict variant.
pub(crate) fn map_unique_violation(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            if let Some(constraint) = db_err.constraint() {
                return match constraint {
                    "accounts_username_key" => AppError::UsernameAlreadyExists,
                    "users_phone_key" => AppError::PhoneAlreadyExists,
                    "users_email_key" => AppError::EmailAlreadyExists,
                    _ => AppError::UniqueConstraintViolation(constraint.to_string()),
                };
            }
        }
    }
    e.into()
}
