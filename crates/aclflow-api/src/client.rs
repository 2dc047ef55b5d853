// HTTP client for the ACL request backend.
//
// Every endpoint module (options, requests, templates, reports, auth) is an
// inherent `impl AclClient` block in its own file; this module only owns
// URL construction, bearer-token injection, and response decoding.

use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::ErrorBody;
use crate::session::SessionStore;
use crate::transport::TransportConfig;

/// Async client for the ACL request backend.
///
/// Authenticated calls read the bearer token from the injected
/// [`SessionStore`]; a `401` on any call clears that store.
pub struct AclClient {
    http: reqwest::Client,
    base_url: Url,
    session: Arc<dyn SessionStore>,
}

impl AclClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build a client from a backend root URL and transport settings.
    pub fn new(
        base_url: &str,
        transport: &TransportConfig,
        session: Arc<dyn SessionStore>,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::with_client(http, base_url, session)
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        base_url: &str,
        session: Arc<dyn SessionStore>,
    ) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self {
            http,
            base_url,
            session,
        })
    }

    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        Ok(url)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The session store shared with this client.
    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.session
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Join a relative path (e.g. `"api/v1/templates"`) onto the base URL.
    pub(crate) fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    fn auth_headers(&self) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        if let Some(token) = self.session.token() {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map_err(|e| Error::Authentication {
                    message: format!("invalid token header value: {e}"),
                })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let resp = self.send_get(path, &[]).await?;
        self.handle_response(resp).await
    }

    pub(crate) async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let resp = self.send_get(path, params).await?;
        self.handle_response(resp).await
    }

    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let resp = self.send_post(path, body).await?;
        self.handle_response(resp).await
    }

    pub(crate) async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("PUT {url}");

        let resp = self
            .http
            .put(url)
            .headers(self.auth_headers()?)
            .json(body)
            .send()
            .await?;
        self.handle_response(resp).await
    }

    /// GET without decoding; the caller inspects status and body itself.
    pub(crate) async fn send_get(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<reqwest::Response, Error> {
        let url = self.url(path)?;
        if params.is_empty() {
            debug!("GET {url}");
        } else {
            debug!("GET {url} params={params:?}");
        }

        let mut req = self.http.get(url).headers(self.auth_headers()?);
        if !params.is_empty() {
            req = req.query(params);
        }
        Ok(req.send().await?)
    }

    /// POST without decoding; the caller inspects status and body itself.
    pub(crate) async fn send_post<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, Error> {
        let url = self.url(path)?;
        debug!("POST {url}");

        Ok(self
            .http
            .post(url)
            .headers(self.auth_headers()?)
            .json(body)
            .send()
            .await?)
    }

    // ── Response handling ────────────────────────────────────────────

    pub(crate) async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            decode(&body)
        } else {
            Err(self.parse_error(status, resp).await)
        }
    }

    pub(crate) async fn parse_error(
        &self,
        status: reqwest::StatusCode,
        resp: reqwest::Response,
    ) -> Error {
        let raw = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&raw)
            .ok()
            .and_then(|b| b.error)
            .unwrap_or_else(|| {
                if raw.is_empty() {
                    status.to_string()
                } else {
                    raw
                }
            });

        match status {
            reqwest::StatusCode::UNAUTHORIZED => {
                debug!(%message, "backend rejected token, clearing session");
                self.session.clear();
                Error::SessionExpired
            }
            reqwest::StatusCode::FORBIDDEN => Error::Forbidden { message },
            _ => Error::Api {
                status: status.as_u16(),
                message,
            },
        }
    }
}

/// Decode a JSON body, keeping a short preview in the error message.
pub(crate) fn decode<T: DeserializeOwned>(body: &str) -> Result<T, Error> {
    serde_json::from_str(body).map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body: body.to_owned(),
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::session::MemorySession;

    fn client(base: &str) -> AclClient {
        AclClient::with_client(reqwest::Client::new(), base, Arc::new(MemorySession::new()))
            .unwrap()
    }

    #[test]
    fn base_url_gains_trailing_slash() {
        let c = client("https://acl.example.com/portal");
        assert_eq!(c.base_url().as_str(), "https://acl.example.com/portal/");
        assert_eq!(
            c.url("/api/v1/help").unwrap().as_str(),
            "https://acl.example.com/portal/api/v1/help"
        );
    }

    #[test]
    fn anonymous_requests_carry_no_authorization() {
        let c = client("http://localhost:5000");
        assert!(c.auth_headers().unwrap().get(AUTHORIZATION).is_none());
    }

    #[test]
    fn decode_error_keeps_preview() {
        let err = decode::<Vec<u8>>("<html>oops</html>").unwrap_err();
        match err {
            Error::Deserialization { message, body } => {
                assert!(message.contains("<html>"));
                assert_eq!(body, "<html>oops</html>");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
