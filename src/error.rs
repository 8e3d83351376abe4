//! Error types for the GLPI helpdesk module.
//!
//! `HelpdeskError` covers both channels the module has: fatal startup
//! failures (login, initial configuration fetch) and per-call failures that
//! the facade logs and turns into empty results.
//!
//! # Security
//!
//! The login password must never reach logs or tool responses. Use
//! `sanitized_display()` whenever an error leaves the crate.

use std::time::Duration;
use thiserror::Error;

/// Unified error type for all helpdesk operations.
#[derive(Error, Debug)]
pub enum HelpdeskError {
    /// Configuration error - invalid environment variables.
    #[error("configuration error: {0}")]
    Config(String),

    /// HTTP client initialization failed.
    #[error("HTTP client error: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// HTTP request failed during transmission.
    #[error("HTTP request failed: {0}")]
    Http(#[source] reqwest::Error),

    /// The endpoint answered with a non-success status code.
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        /// The HTTP status code returned.
        status: reqwest::StatusCode,
        /// The (truncated) response body.
        body: String,
    },

    /// Request timed out.
    #[error("request timed out after {duration:?} ({operation})")]
    Timeout {
        /// How long we waited before timing out.
        duration: Duration,
        /// The procedure that timed out.
        operation: String,
    },

    /// The web service declared a fault for the call.
    #[error("GLPI fault {code}: {message}")]
    Fault {
        /// Fault code reported by the web service.
        code: i64,
        /// Fault string reported by the web service.
        message: String,
    },

    /// The login procedure refused the credentials.
    #[error("authentication refused, fault code {code}: {message}")]
    Authentication {
        /// Fault code reported by `doLogin`.
        code: i64,
        /// Fault string reported by `doLogin`.
        message: String,
    },

    /// JSON encoding or decoding failed.
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The answer is not well-formed XML.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The answer is XML but not a valid XML-RPC document.
    #[error("XML-RPC protocol error: {0}")]
    Protocol(String),

    /// The module could not complete its startup sequence.
    #[error("initialization failed: {0}")]
    Initialization(String),
}

impl HelpdeskError {
    /// Creates a configuration error for an invalid value.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        HelpdeskError::Config(message.into())
    }

    /// Creates a remote fault.
    pub fn fault(code: i64, message: impl Into<String>) -> Self {
        HelpdeskError::Fault {
            code,
            message: message.into(),
        }
    }

    /// Creates an XML-RPC protocol error.
    pub fn protocol(message: impl Into<String>) -> Self {
        HelpdeskError::Protocol(message.into())
    }

    /// Creates a startup failure wrapping the underlying cause.
    pub fn initialization(message: impl Into<String>) -> Self {
        HelpdeskError::Initialization(message.into())
    }

    /// Returns true if the web service itself rejected the call.
    #[must_use]
    pub fn is_fault(&self) -> bool {
        matches!(
            self,
            HelpdeskError::Fault { .. } | HelpdeskError::Authentication { .. }
        )
    }

    /// Replaces any occurrence of `secret` in `message` with `[REDACTED]`.
    #[must_use]
    pub fn sanitize_message(message: &str, secret: &str) -> String {
        if secret.is_empty() {
            return message.to_string();
        }
        message.replace(secret, "[REDACTED]")
    }

    /// Display message with `secret` stripped.
    #[must_use]
    pub fn sanitized_display(&self, secret: &str) -> String {
        Self::sanitize_message(&self.to_string(), secret)
    }
}
