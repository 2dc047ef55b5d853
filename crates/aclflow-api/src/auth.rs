// Credential exchange and role lookup.
//
// Login stores the issued bearer token in the client's session store; every
// later call picks it up from there.

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::{debug, info};

use crate::client::{AclClient, decode};
use crate::error::Error;
use crate::models::{LoginResponse, RoleResponse, SignupRequest, UserInfo};

impl AclClient {
    /// Exchange email + password for a bearer token.
    ///
    /// `POST /api/v1/auth/login`. Any non-2xx answer (the backend uses 401
    /// for unknown users and bad passwords) is an `Authentication` error.
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<UserInfo, Error> {
        debug!(email, "logging in");
        let body = json!({
            "email": email,
            "password": password.expose_secret(),
        });
        let resp = self.send_post("api/v1/auth/login", &body).await?;
        let status = resp.status();
        let raw = resp.text().await?;

        if !status.is_success() {
            return Err(Error::Authentication {
                message: error_message(&raw).unwrap_or_else(|| format!("login failed (HTTP {status})")),
            });
        }

        let login: LoginResponse = decode(&raw)?;
        info!(username = %login.user.username, "logged in");
        self.session()
            .set(SecretString::from(login.token), login.user.clone());
        Ok(login.user)
    }

    /// Register a new account.
    ///
    /// `POST /api/v1/auth/signup`. A `409` means the account already exists.
    pub async fn signup(&self, request: &SignupRequest) -> Result<serde_json::Value, Error> {
        debug!(username = %request.username, "signing up");
        let resp = self.send_post("api/v1/auth/signup", request).await?;
        let status = resp.status();
        let raw = resp.text().await?;

        if !status.is_success() {
            return Err(Error::Authentication {
                message: error_message(&raw).unwrap_or_else(|| format!("signup failed (HTTP {status})")),
            });
        }
        if raw.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        decode(&raw)
    }

    /// The caller's role as the backend sees it.
    ///
    /// `GET /api/v1/rbac/role`
    pub async fn role(&self) -> Result<String, Error> {
        if !self.session().is_authenticated() {
            return Err(Error::NotAuthenticated);
        }
        let resp: RoleResponse = self.get("api/v1/rbac/role").await?;
        Ok(resp.role)
    }

    /// Forget the current token. The backend keeps no server-side session.
    pub fn logout(&self) {
        self.session().clear();
    }
}

fn error_message(raw: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(raw)
        .ok()?
        .get("error")?
        .as_str()
        .map(str::to_owned)
}
