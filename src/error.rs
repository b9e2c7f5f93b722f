//! Error types for the matchform crawler.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use matchform::{Result, Error};
//!
//! async fn example(correlator: &Correlator<'_>) -> Result<()> {
//!     let body = correlator.await_json("/api/v1/event/111").await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Navigation | [`Error::Navigation`] |
//! | Capture | [`Error::CorrelationMiss`], [`Error::BodyUnavailable`] |
//! | Parsing | [`Error::MalformedJson`], [`Error::MissingField`] |
//! | Execution | [`Error::Timeout`] |
//! | External | [`Error::Io`], [`Error::Json`] |
//!
//! Popup absence is deliberately *not* an error: dismissal returns
//! `Ok(false)` and is logged at low severity only.

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;

use crate::identifiers::RequestId;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging. The pipeline
/// treats most variants as stage-local (degrade the record, continue);
/// only the Discover stage escalates them to a run failure.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when crawl configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Navigation Errors
    // ========================================================================
    /// Navigation failed at the transport level (timeout, DNS, crash).
    #[error("Navigation failed for {url}: {message}")]
    Navigation {
        /// URL that could not be reached.
        url: String,
        /// Description from the underlying page driver.
        message: String,
    },

    // ========================================================================
    // Capture Errors
    // ========================================================================
    /// No captured event matched the expected API path within the
    /// observation window.
    #[error("No captured event matched {path} within {waited_ms}ms")]
    CorrelationMiss {
        /// The exact path that was expected.
        path: String,
        /// Milliseconds spent polling before giving up.
        waited_ms: u64,
    },

    /// A matching event was found but its body could not be retrieved,
    /// e.g. the browser already evicted the response from its buffer.
    #[error("Response body unavailable for request {request_id}")]
    BodyUnavailable {
        /// Request whose body was requested.
        request_id: RequestId,
    },

    // ========================================================================
    // Parsing Errors
    // ========================================================================
    /// A response body was retrieved but did not parse as JSON.
    #[error("Malformed JSON from {path}: {message}")]
    MalformedJson {
        /// API path the body was correlated to.
        path: String,
        /// Parser error description.
        message: String,
    },

    /// A response body parsed but lacked an expected key.
    #[error("Missing field `{field}` in response from {path}")]
    MissingField {
        /// API path the body was correlated to.
        path: String,
        /// JSON pointer of the missing field.
        field: String,
    },

    // ========================================================================
    // Execution Errors
    // ========================================================================
    /// Operation exceeded its deadline.
    #[error("Timeout after {timeout_ms}ms: {operation}")]
    Timeout {
        /// Description of the operation that timed out.
        operation: String,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a navigation error.
    #[inline]
    pub fn navigation(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Navigation {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates a correlation miss error.
    #[inline]
    pub fn correlation_miss(path: impl Into<String>, waited_ms: u64) -> Self {
        Self::CorrelationMiss {
            path: path.into(),
            waited_ms,
        }
    }

    /// Creates a body unavailable error.
    #[inline]
    pub fn body_unavailable(request_id: RequestId) -> Self {
        Self::BodyUnavailable { request_id }
    }

    /// Creates a malformed JSON error.
    #[inline]
    pub fn malformed_json(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedJson {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a missing field error.
    #[inline]
    pub fn missing_field(path: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingField {
            path: path.into(),
            field: field.into(),
        }
    }

    /// Creates a timeout error.
    #[inline]
    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns `true` if this error degrades a record rather than
    /// aborting the run at stages after Discover.
    ///
    /// The pipeline leaves the affected field(s) unset and continues
    /// when one of these occurs. A [`Error::BodyUnavailable`] is
    /// treated identically to a correlation miss downstream.
    #[inline]
    #[must_use]
    pub fn is_degradable(&self) -> bool {
        matches!(
            self,
            Self::Navigation { .. }
                | Self::CorrelationMiss { .. }
                | Self::BodyUnavailable { .. }
                | Self::MalformedJson { .. }
                | Self::MissingField { .. }
        )
    }

    /// Returns `true` if this error may succeed on a retry with a
    /// fresh reload-and-settle cycle.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::CorrelationMiss { .. } | Self::BodyUnavailable { .. } | Self::Timeout { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
