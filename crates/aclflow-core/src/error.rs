// ── Core error types ──
//
// User-facing errors from aclflow-core. Consumers never see raw HTTP
// details: the `From<aclflow_api::Error>` impl maps transport failures
// into domain variants, and the form workflow adds its own.

use thiserror::Error;

use crate::model::{RowField, ValidationErrorSet};

/// A row the backend accepted during a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedRow {
    /// 1-based row number.
    pub row: usize,
    pub request_id: Option<String>,
}

/// A row whose create call failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedRow {
    /// 1-based row number.
    pub row: usize,
    pub message: String,
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to backend at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Session expired -- please log in again")]
    SessionExpired,

    #[error("Permission denied: {message}")]
    Forbidden { message: String },

    #[error("Backend request timed out")]
    Timeout,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Not found: {identifier}")]
    NotFound { identifier: String },

    #[error("Row {index} does not exist (form has {len} rows)")]
    RowOutOfRange { index: usize, len: usize },

    // ── Form workflow ────────────────────────────────────────────────
    #[error("{message}")]
    LocalValidation {
        row: usize,
        field: RowField,
        message: String,
    },

    #[error("Validation failed. Please fix the errors highlighted below")]
    RemoteValidation { invalid_rows: ValidationErrorSet },

    #[error("Submitted {} request(s), {} failed", .succeeded.len(), .failed.len())]
    PartialSubmission {
        succeeded: Vec<SubmittedRow>,
        failed: Vec<FailedRow>,
    },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Returns `true` if logging in again might resolve this error.
    pub fn needs_login(&self) -> bool {
        matches!(self, Self::SessionExpired | Self::AuthenticationFailed { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<aclflow_api::Error> for CoreError {
    fn from(err: aclflow_api::Error) -> Self {
        match err {
            aclflow_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            aclflow_api::Error::SessionExpired => CoreError::SessionExpired,
            aclflow_api::Error::NotAuthenticated => CoreError::AuthenticationFailed {
                message: "not logged in".into(),
            },
            aclflow_api::Error::Forbidden { message } => CoreError::Forbidden { message },
            aclflow_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map(ToString::to_string)
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            aclflow_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            aclflow_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            aclflow_api::Error::Api { status: 404, message } => CoreError::NotFound {
                identifier: message,
            },
            aclflow_api::Error::Api { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            aclflow_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
