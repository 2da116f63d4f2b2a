//! Error types for the TagMatch engine
//!
//! The matcher itself never fails: degenerate input resolves to an empty
//! result. Everything around it (configuration, the catalog provider,
//! the HTTP surface) reports failures through this hierarchy:
//! - `thiserror` for ergonomic error definitions
//! - Domain-specific variants for actionable error handling
//! - Source chaining for transport errors
//! - HTTP status code mapping for API responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::borrow::Cow;
use thiserror::Error;

/// Result type alias for TagMatch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Why a selection was rejected by the form-level checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionIssue {
    /// No recommendation type was chosen
    MissingMode,
    /// Neither a preference nor a feature was selected
    NoTagsSelected,
}

impl std::fmt::Display for SelectionIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectionIssue::MissingMode => write!(f, "please select a recommendation type"),
            SelectionIssue::NoTagsSelected => {
                write!(f, "please select at least one preference or feature")
            }
        }
    }
}

/// Main error type for the TagMatch engine
#[derive(Debug, Error)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidConfig {
        key: &'static str,
        message: Cow<'static, str>,
    },

    // ========================================================================
    // Catalog Provider Errors
    // ========================================================================
    #[error("Catalog provider error: {message}")]
    Catalog {
        message: Cow<'static, str>,
        #[source]
        source: Option<reqwest::Error>,
    },

    #[error("Catalog provider responded with HTTP {status}")]
    CatalogStatus { status: u16 },

    #[error("Catalog unavailable after {attempts} attempts")]
    CatalogUnavailable { attempts: u32 },

    #[error("Invalid catalog: {message}")]
    InvalidCatalog { message: Cow<'static, str> },

    // ========================================================================
    // API Errors
    // ========================================================================
    #[error("Bad request: {message}")]
    BadRequest { message: Cow<'static, str> },

    #[error("Invalid selection: {reason}")]
    InvalidSelection { reason: SelectionIssue },

    #[error("Internal server error")]
    Internal {
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // ========================================================================
    // Generic Errors
    // ========================================================================
    #[error("Operation timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

impl Error {
    // ========================================================================
    // Constructors for common error patterns
    // ========================================================================

    /// Create a catalog provider error
    pub fn catalog(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Catalog {
            message: message.into(),
            source: None,
        }
    }

    /// Create a catalog provider error with source
    pub fn catalog_with_source(message: impl Into<Cow<'static, str>>, source: reqwest::Error) -> Self {
        Self::Catalog {
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a bad request error
    pub fn bad_request(message: impl Into<Cow<'static, str>>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Internal {
            source: Some(Box::new(source)),
        }
    }

    // ========================================================================
    // Error Classification
    // ========================================================================

    /// Returns true if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Catalog { .. } | Error::Timeout { .. } => true,
            // 4xx from the provider will not fix itself
            Error::CatalogStatus { status } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Returns true if this error should be logged at error level
    pub fn is_error_level(&self) -> bool {
        matches!(
            self,
            Error::Catalog { .. }
                | Error::CatalogUnavailable { .. }
                | Error::InvalidCatalog { .. }
                | Error::Internal { .. }
        )
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest { .. } | Error::InvalidSelection { .. } => StatusCode::BAD_REQUEST,
            Error::Catalog { .. }
            | Error::CatalogStatus { .. }
            | Error::CatalogUnavailable { .. }
            | Error::InvalidCatalog { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Error::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::InvalidConfig { .. } => "CONFIG_ERROR",
            Error::Catalog { .. }
            | Error::CatalogStatus { .. }
            | Error::CatalogUnavailable { .. }
            | Error::InvalidCatalog { .. } => "CATALOG_ERROR",
            Error::BadRequest { .. } => "BAD_REQUEST",
            Error::InvalidSelection {
                reason: SelectionIssue::MissingMode,
            } => "MISSING_RECOMMENDATION_TYPE",
            Error::InvalidSelection {
                reason: SelectionIssue::NoTagsSelected,
            } => "NO_TAGS_SELECTED",
            Error::Timeout { .. } => "TIMEOUT",
            Error::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

// ============================================================================
// Error Response for API
// ============================================================================

/// API error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        // Don't expose internal error details
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        };

        let retry_after = if status == StatusCode::SERVICE_UNAVAILABLE {
            Some(5)
        } else {
            None
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code,
                message,
                retry_after,
            },
        };

        (status, Json(body)).into_response()
    }
}

// ============================================================================
// From implementations for external error types
// ============================================================================

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Error::CatalogStatus {
                status: status.as_u16(),
            };
        }
        Error::Catalog {
            message: err.to_string().into(),
            source: Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::internal(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_retryable() {
        assert!(Error::catalog("connection refused").is_retryable());
        assert!(Error::CatalogStatus { status: 503 }.is_retryable());
        assert!(Error::CatalogStatus { status: 429 }.is_retryable());
        assert!(!Error::CatalogStatus { status: 404 }.is_retryable());
        assert!(!Error::InvalidSelection {
            reason: SelectionIssue::MissingMode
        }
        .is_retryable());
    }

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            Error::InvalidSelection {
                reason: SelectionIssue::NoTagsSelected
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::CatalogUnavailable { attempts: 3 }.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            Error::Internal { source: None }.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_provider_faults_are_unavailable() {
        let malformed = Error::InvalidCatalog {
            message: "malformed catalog body".into(),
        };
        assert_eq!(malformed.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(malformed.error_code(), "CATALOG_ERROR");
        assert_eq!(
            Error::bad_request("expected value").status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_selection_error_codes() {
        assert_eq!(
            Error::InvalidSelection {
                reason: SelectionIssue::MissingMode
            }
            .error_code(),
            "MISSING_RECOMMENDATION_TYPE"
        );
        assert_eq!(
            Error::InvalidSelection {
                reason: SelectionIssue::NoTagsSelected
            }
            .error_code(),
            "NO_TAGS_SELECTED"
        );
    }
}
