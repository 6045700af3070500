//! Error types for Pulse tooling
//!
//! Provides a small, disjoint error taxonomy:
//! - `AuthError` for directory lookups and credential checks
//! - `ApiError` for remote calls (remote status, transport, parse)
//! - `AppError` as the umbrella returned by every core operation
//! - `ErrorCode` for machine-readable identification

use crate::session::IntakePhase;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (1xxx)
    ValidationError,

    // Authentication errors (2xxx)
    NotAuthenticated,
    OrganizationNotFound,
    InvalidCredential,
    DirectoryError,

    // Lifecycle errors (3xxx)
    InvalidPhase,

    // Remote API errors (8xxx)
    RemoteError,
    TransportTimeout,
    TransportConnect,
    TransportError,
    ParseError,

    // Internal errors (9xxx)
    ConfigurationError,
    IoError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            ErrorCode::ValidationError => 1001,

            ErrorCode::NotAuthenticated => 2001,
            ErrorCode::OrganizationNotFound => 2002,
            ErrorCode::InvalidCredential => 2003,
            ErrorCode::DirectoryError => 2004,

            ErrorCode::InvalidPhase => 3001,

            ErrorCode::RemoteError => 8001,
            ErrorCode::TransportTimeout => 8002,
            ErrorCode::TransportConnect => 8003,
            ErrorCode::TransportError => 8004,
            ErrorCode::ParseError => 8005,

            ErrorCode::ConfigurationError => 9001,
            ErrorCode::IoError => 9002,
        }
    }
}

/// What went wrong below the HTTP layer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// The bounded request timeout elapsed
    Timeout,
    /// DNS resolution or TCP/TLS connection failed
    Connect,
    Other,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransportKind::Timeout => "timeout",
            TransportKind::Connect => "connect",
            TransportKind::Other => "other",
        };
        f.write_str(label)
    }
}

/// Outcome of a failed remote call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The server answered with a non-success status
    #[error("Remote API returned {status}: {body}")]
    Remote { status: u16, body: String },

    /// The request never produced a response
    #[error("Transport failure ({kind}): {cause}")]
    Transport { kind: TransportKind, cause: String },

    /// A success body that should have been JSON was not
    #[error("Malformed response body: {raw}")]
    Parse { raw: String },
}

impl ApiError {
    /// HTTP status of a remote rejection
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            ApiError::Transport {
                kind: TransportKind::Timeout,
                ..
            }
        )
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            TransportKind::Timeout
        } else if err.is_connect() {
            TransportKind::Connect
        } else {
            TransportKind::Other
        };

        ApiError::Transport {
            kind,
            cause: err.to_string(),
        }
    }
}

/// Directory and credential failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Organization not found: {org_name}")]
    NotFound { org_name: String },

    #[error("Invalid credential")]
    InvalidCredential,

    #[error("Directory lookup failed: {message}")]
    Directory { message: String },
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        AuthError::Directory {
            message: err.to_string(),
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Cannot {operation} while intake is {phase}")]
    InvalidPhase {
        operation: &'static str,
        phase: IntakePhase,
    },

    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Shorthand for a field-level validation failure
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        AppError::Validation {
            message: message.into(),
            field: Some(field.to_string()),
        }
    }

    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Auth(AuthError::NotFound { .. }) => ErrorCode::OrganizationNotFound,
            AppError::Auth(AuthError::InvalidCredential) => ErrorCode::InvalidCredential,
            AppError::Auth(AuthError::Directory { .. }) => ErrorCode::DirectoryError,
            AppError::Api(ApiError::Remote { .. }) => ErrorCode::RemoteError,
            AppError::Api(ApiError::Transport { kind, .. }) => match kind {
                TransportKind::Timeout => ErrorCode::TransportTimeout,
                TransportKind::Connect => ErrorCode::TransportConnect,
                TransportKind::Other => ErrorCode::TransportError,
            },
            AppError::Api(ApiError::Parse { .. }) => ErrorCode::ParseError,
            AppError::NotAuthenticated => ErrorCode::NotAuthenticated,
            AppError::InvalidPhase { .. } => ErrorCode::InvalidPhase,
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::Io(_) => ErrorCode::IoError,
        }
    }

    /// HTTP status of a remote rejection, if this is one
    pub fn remote_status(&self) -> Option<u16> {
        match self {
            AppError::Api(api) => api.status(),
            _ => None,
        }
    }

    /// Errors raised locally before any request was issued
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            AppError::NotAuthenticated
                | AppError::InvalidPhase { .. }
                | AppError::Validation { .. }
                | AppError::Configuration { .. }
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration {
            message: err.to_string(),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errs: validator::ValidationErrors) -> Self {
        let field = errs.field_errors().keys().next().map(|f| f.to_string());
        AppError::Validation {
            message: errs.to_string(),
            field,
        }
    }
}
