//!
//! # Custom Error Handling
//!
//! This module defines the `AppError` type used by every layer of the service: the token
//! service, the auth gate, the ownership-scoped services and the stores all fail with it,
//! and route handlers return it directly.
//!
//! `AppError` implements `actix_web::error::ResponseError`, so the taxonomy maps onto HTTP
//! in one place. Two rules hold for every response produced here:
//!
//! - authentication failures never say *which* check failed;
//! - internal and database failures never leak their detail to the client (it is logged).
//!
//! `From` conversions for `sqlx::Error`, `validator::ValidationErrors`,
//! `jsonwebtoken::errors::Error`, `bcrypt::BcryptError` and `BlockingError` let callers use `?`.

use actix_web::{error::BlockingError, error::ResponseError, http::StatusCode, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

/// Body sent for any authentication failure.
pub const UNAUTHORIZED_MESSAGE: &str = "Not authorized";
/// Body sent for any internal failure.
pub const SERVER_ERROR_MESSAGE: &str = "Server error";

/// A single failed input field, as reported to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Represents all possible errors that can occur within the application.
#[derive(Debug)]
pub enum AppError {
    /// Malformed or missing request fields (HTTP 400, structured field errors).
    Validation(Vec<FieldError>),
    /// A client error with a message that is safe to show, e.g. "Invalid credentials" (HTTP 400).
    BadRequest(String),
    /// The owner or parent collection is at capacity (HTTP 400).
    QuotaExceeded {
        /// What was being created, e.g. "project".
        resource: &'static str,
        limit: usize,
    },
    /// Missing, invalid or expired credentials (HTTP 401).
    /// The message is a server-side detail and is only logged.
    Unauthorized(String),
    /// No matching resource owned by the caller (HTTP 404).
    NotFound(String),
    /// Unexpected failure outside the database (HTTP 500).
    InternalServerError(String),
    /// Failure reported by the database driver (HTTP 500).
    DatabaseError(String),
}

impl AppError {
    /// Message sent to the client for quota failures.
    fn quota_message(resource: &str, limit: usize) -> String {
        match resource {
            "project" => format!("Maximum project limit reached ({})", limit),
            "task" => format!("Maximum task limit reached for this project ({})", limit),
            other => format!("Maximum {} limit reached ({})", other, limit),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Validation(errors) => {
                let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
                write!(f, "Validation Error: invalid fields [{}]", fields.join(", "))
            }
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::QuotaExceeded { resource, limit } => {
                write!(f, "Quota Exceeded: {}", Self::quota_message(resource, *limit))
            }
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// Converts `AppError` variants into `HttpResponse` objects.
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) | AppError::QuotaExceeded { .. } => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        match self {
            AppError::Validation(errors) => builder.json(json!({ "errors": errors })),
            AppError::BadRequest(msg) | AppError::NotFound(msg) => {
                builder.json(json!({ "message": msg }))
            }
            AppError::QuotaExceeded { resource, limit } => builder.json(json!({
                "message": Self::quota_message(resource, *limit)
            })),
            AppError::Unauthorized(detail) => {
                log::debug!("rejected request: {}", detail);
                builder.json(json!({ "message": UNAUTHORIZED_MESSAGE }))
            }
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                log::error!("{}", self);
                builder.json(json!({ "message": SERVER_ERROR_MESSAGE }))
            }
        }
    }
}

/// `RowNotFound` becomes `NotFound`; everything else is a database error.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            _ => AppError::DatabaseError(error.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(error: sqlx::migrate::MigrateError) -> AppError {
        AppError::DatabaseError(format!("migration failed: {}", error))
    }
}

/// Flattens `validator` output into one `FieldError` per failed rule, sorted by field name.
impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> AppError {
        let mut fields: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, failures)| {
                failures.iter().map(move |failure| FieldError {
                    field: field.to_string(),
                    message: failure
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("invalid {} ({})", field, failure.code)),
                })
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        AppError::Validation(fields)
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(error: jsonwebtoken::errors::Error) -> AppError {
        AppError::Unauthorized(format!("invalid token: {}", error))
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::InternalServerError(format!("password hashing failed: {}", error))
    }
}

impl From<BlockingError> for AppError {
    fn from(error: BlockingError) -> AppError {
        AppError::InternalServerError(format!("blocking task failed: {}", error))
    }
}
