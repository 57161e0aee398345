//! Error types for the Solinte SDK.

use std::collections::BTreeMap;

use thiserror::Error;

pub use crate::auth::error::OAuthError;

/// Primary error type for all SDK operations.
#[derive(Error, Debug)]
pub enum SolinteError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    OAuth(#[from] OAuthError),

    #[error("API error{}: {message}", fmt_status(.status))]
    Api { message: String, status: Option<u16> },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration or scope validation failure.
///
/// `errors` maps each offending field to a message. Scope validation also
/// lists the rejected names in `invalid_scopes`, in input order.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
    pub errors: BTreeMap<String, String>,
    pub invalid_scopes: Vec<String>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>, errors: BTreeMap<String, String>) -> Self {
        Self {
            message: message.into(),
            errors,
            invalid_scopes: Vec::new(),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Field names with a validation failure, sorted.
    pub fn fields(&self) -> Vec<&str> {
        self.errors.keys().map(String::as_str).collect()
    }
}

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Authentication,
    Network,
    Server,
    Api,
    InvalidArgument,
    Io,
}

impl SolinteError {
    /// Create an API error.
    pub fn api(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Api {
            message: message.into(),
            status,
        }
    }

    /// HTTP status code attached to the error, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::OAuth(err) => err.status(),
            Self::Api { status, .. } => *status,
            _ => None,
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation(_) => ErrorCategory::Validation,
            Self::OAuth(OAuthError::Connection(_)) => ErrorCategory::Network,
            Self::OAuth(_) => ErrorCategory::Authentication,
            Self::Api { status: None, .. } => ErrorCategory::Api,
            Self::Api {
                status: Some(status),
                ..
            } => match status {
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Api,
            },
            Self::InvalidArgument(_) => ErrorCategory::InvalidArgument,
            Self::Io(_) => ErrorCategory::Io,
        }
    }
}

fn fmt_status(status: &Option<u16>) -> String {
    status.map(|s| format!(" (status {s})")).unwrap_or_default()
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, SolinteError>;
