//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and a stable process exit code.

use miette::Diagnostic;
use thiserror::Error;

use aclflow_config::ConfigError;
use aclflow_core::CoreError;

pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to the backend at {url}")]
    #[diagnostic(
        code(aclflow::connection_failed),
        help(
            "Check that the service is running and reachable.\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(aclflow::timeout),
        help("Increase the timeout with --timeout or check backend responsiveness.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(aclflow::auth_failed),
        help(
            "Verify your email and password.\n\
             Run: aclflow config set-password"
        )
    )]
    AuthFailed { message: String },

    #[error("Session expired")]
    #[diagnostic(
        code(aclflow::session_expired),
        help("Log in again with: aclflow auth login")
    )]
    SessionExpired,

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(aclflow::no_credentials),
        help(
            "Set an email with: aclflow config set email you@example.com\n\
             and a password with: aclflow config set-password\n\
             or export ACLFLOW_EMAIL and ACLFLOW_PASSWORD."
        )
    )]
    NoCredentials { profile: String },

    #[error("Permission denied: {message}")]
    #[diagnostic(
        code(aclflow::forbidden),
        help("Your role does not allow this operation. Check it with: aclflow auth whoami")
    )]
    Forbidden { message: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(aclflow::not_found),
        help("Run: aclflow {list_command} to see what exists")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── API ──────────────────────────────────────────────────────────
    #[error("Backend error{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    #[diagnostic(code(aclflow::api_error))]
    ApiError { status: Option<u16>, message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(aclflow::validation))]
    Validation { field: String, reason: String },

    #[error("{message}")]
    #[diagnostic(code(aclflow::local_validation))]
    LocalValidation { message: String },

    #[error("Validation failed. Please fix the errors highlighted below")]
    #[diagnostic(
        code(aclflow::invalid_rows),
        help("{details}")
    )]
    InvalidRows { count: usize, details: String },

    #[error("{summary}")]
    #[diagnostic(
        code(aclflow::partial_submission),
        help(
            "{details}\n\
             Fix the failed rows and submit only those again."
        )
    )]
    PartialSubmission { summary: String, details: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(aclflow::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: aclflow config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No backend configured")]
    #[diagnostic(
        code(aclflow::no_config),
        help(
            "Create a profile with: aclflow config init\n\
             or pass --backend. Config expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(aclflow::config))]
    Config(Box<ConfigError>),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("'{action}' requires confirmation")]
    #[diagnostic(
        code(aclflow::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(code(aclflow::io))]
    Io(#[from] std::io::Error),

    #[error("Invalid rows file {path}: {reason}")]
    #[diagnostic(
        code(aclflow::rows_file),
        help("Expected a JSON or YAML list of requests, or an object with a `requests` list.")
    )]
    RowsFile { path: String, reason: String },
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::SessionExpired | Self::NoCredentials { .. } => {
                exit_code::AUTH
            }
            Self::Forbidden { .. } => exit_code::PERMISSION,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::PartialSubmission { .. } => exit_code::CONFLICT,
            Self::Validation { .. }
            | Self::LocalValidation { .. }
            | Self::InvalidRows { .. }
            | Self::RowsFile { .. }
            | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },
            CoreError::SessionExpired => CliError::SessionExpired,
            CoreError::Forbidden { message } => CliError::Forbidden { message },
            CoreError::Timeout => CliError::Timeout,

            CoreError::NotFound { identifier } => CliError::NotFound {
                resource_type: "request".into(),
                identifier,
                list_command: "requests list".into(),
            },

            CoreError::RowOutOfRange { index, len } => CliError::Validation {
                field: "row".into(),
                reason: format!("row {index} does not exist (form has {len} rows)"),
            },

            CoreError::LocalValidation { message, .. } => CliError::LocalValidation { message },

            CoreError::RemoteValidation { invalid_rows } => CliError::InvalidRows {
                count: invalid_rows.len(),
                details: invalid_rows.to_string(),
            },

            ref partial @ CoreError::PartialSubmission {
                ref succeeded,
                ref failed,
            } => {
                let mut lines: Vec<String> = succeeded
                    .iter()
                    .map(|s| {
                        format!(
                            "Request #{}: submitted as {}",
                            s.row,
                            s.request_id.as_deref().unwrap_or("N/A")
                        )
                    })
                    .collect();
                lines.extend(
                    failed
                        .iter()
                        .map(|f| format!("Request #{}: {}", f.row, f.message)),
                );
                CliError::PartialSubmission {
                    summary: partial.to_string(),
                    details: lines.join("\n"),
                }
            }

            CoreError::Api { message, status } => CliError::ApiError { status, message },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Internal(message) => CliError::ApiError {
                status: None,
                message,
            },
        }
    }
}

impl From<aclflow_api::Error> for CliError {
    fn from(err: aclflow_api::Error) -> Self {
        CoreError::from(err).into()
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::UnknownProfile { name } => {
                let available = aclflow_config::load_config_or_default()
                    .profiles
                    .keys()
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(", ");
                CliError::ProfileNotFound {
                    name,
                    available: if available.is_empty() {
                        "(none)".into()
                    } else {
                        available
                    },
                }
            }
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            other => CliError::Config(Box::new(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aclflow_core::{FailedRow, SubmittedRow, ValidationErrorSet};

    #[test]
    fn exit_codes_follow_error_class() {
        assert_eq!(CliError::SessionExpired.exit_code(), exit_code::AUTH);
        assert_eq!(CliError::Timeout.exit_code(), exit_code::TIMEOUT);
        let err: CliError = CoreError::NotFound {
            identifier: "42".into(),
        }
        .into();
        assert_eq!(err.exit_code(), exit_code::NOT_FOUND);
    }

    #[test]
    fn remote_rejection_lists_rows() {
        let mut set = ValidationErrorSet::new();
        set.insert(1, "service", "Invalid service");
        let err: CliError = CoreError::RemoteValidation { invalid_rows: set }.into();
        assert_eq!(err.exit_code(), exit_code::USAGE);
        match err {
            CliError::InvalidRows { count, details } => {
                assert_eq!(count, 1);
                assert!(details.contains("Invalid service"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn partial_submission_names_each_row() {
        let err: CliError = CoreError::PartialSubmission {
            succeeded: vec![SubmittedRow {
                row: 1,
                request_id: Some("17".into()),
            }],
            failed: vec![FailedRow {
                row: 2,
                message: "duplicate rule".into(),
            }],
        }
        .into();
        assert_eq!(err.exit_code(), exit_code::CONFLICT);
        let CliError::PartialSubmission { summary, details } = err else {
            panic!("expected a partial submission");
        };
        assert_eq!(summary, "Submitted 1 request(s), 1 failed");
        assert!(details.contains("Request #1: submitted as 17"));
        assert!(details.contains("Request #2: duplicate rule"));
    }
}
