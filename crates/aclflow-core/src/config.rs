// ── Runtime connection configuration ──
//
// These types describe how to reach the backend. They carry credentials
// and transport tuning but never touch disk: the CLI resolves a profile
// into a `BackendConfig` and hands it in.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use tracing::debug;
use url::Url;

use aclflow_api::{AclClient, SessionStore, TlsMode, TransportConfig};

use crate::error::CoreError;

/// Email and password for the login exchange.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed certs).
    DangerAcceptInvalid,
}

/// Configuration for one backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Backend root URL (e.g., `https://acl.example.com`).
    pub url: Url,
    /// Used to log in when the session holds no token.
    pub credentials: Option<Credentials>,
    pub tls: TlsVerification,
    pub timeout: Duration,
}

impl BackendConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            credentials: None,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: match &self.tls {
                TlsVerification::SystemDefaults => TlsMode::System,
                TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
                TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
            },
            timeout: self.timeout,
        }
    }

    /// Build a client over `session`, logging in first when the session is
    /// empty and credentials are configured.
    pub async fn connect(&self, session: Arc<dyn SessionStore>) -> Result<AclClient, CoreError> {
        let client = AclClient::new(self.url.as_str(), &self.transport(), session)?;
        if client.session().is_authenticated() {
            debug!(url = %self.url, "reusing existing session");
            return Ok(client);
        }
        if let Some(creds) = &self.credentials {
            client.login(&creds.email, &creds.password).await?;
        }
        Ok(client)
    }
}
