use thiserror::Error;

/// Top-level error type for the `aclflow-api` crate.
///
/// Covers every failure mode of the backend surface: credential exchange,
/// session expiry, transport, and structured API rejections.
/// `aclflow-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login or signup rejected (wrong credentials, duplicate account, etc.)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The backend answered 401 on an authenticated call. The session
    /// store has already been cleared when this is returned.
    #[error("Session expired -- please log in again")]
    SessionExpired,

    /// An authenticated call was attempted with no token in the session.
    #[error("Not logged in")]
    NotAuthenticated,

    /// The token is valid but the role does not grant access (HTTP 403).
    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Backend ─────────────────────────────────────────────────────
    /// Non-2xx response, with the `{"error": "..."}` message when present.
    #[error("Backend error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if logging in again might resolve this error.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::SessionExpired | Self::NotAuthenticated)
    }

    /// Returns `true` if this is a transient error worth retrying by hand.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Api { status: 404, .. } => true,
            _ => false,
        }
    }

    /// HTTP status associated with this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::SessionExpired => Some(401),
            Self::Forbidden { .. } => Some(403),
            Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
