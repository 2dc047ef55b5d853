// ACL request endpoints: bulk validation, creation, and the review workflow.

use chrono::Utc;
use tracing::debug;

use crate::client::{AclClient, decode};
use crate::error::Error;
use crate::models::{
    AclRequestEnvelope, AclRequestPayload, AclRequestRecord, AclRequestsResponse, CommentBody,
    CreatedRequest, RequestsEnvelope, StatusUpdate, ValidationResponse,
};

impl AclClient {
    // ── Submission ───────────────────────────────────────────────────

    /// Run the backend's authoritative validation over every row.
    ///
    /// `POST /api/v1/validate-requests` with `{"requests": [...]}`. The
    /// backend answers `400` alongside the verdict when any row is invalid,
    /// so a non-2xx body that parses as a verdict is returned as `Ok`.
    pub async fn validate_requests(
        &self,
        rows: &[AclRequestPayload],
    ) -> Result<ValidationResponse, Error> {
        debug!(rows = rows.len(), "validating requests remotely");
        let resp = self
            .send_post("api/v1/validate-requests", &RequestsEnvelope { requests: rows })
            .await?;

        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            return decode(&body);
        }
        if matches!(
            status,
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN
        ) {
            return Err(self.parse_error(status, resp).await);
        }

        let body = resp.text().await.unwrap_or_default();
        match serde_json::from_str::<ValidationResponse>(&body) {
            Ok(verdict) => Ok(verdict),
            Err(_) => Err(Error::Api {
                status: status.as_u16(),
                message: serde_json::from_str::<serde_json::Value>(&body)
                    .ok()
                    .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_owned))
                    .unwrap_or_else(|| status.to_string()),
            }),
        }
    }

    /// Create one ACL request.
    ///
    /// `POST /create_acl_request`
    pub async fn create_request(&self, row: &AclRequestPayload) -> Result<CreatedRequest, Error> {
        debug!(system_type = %row.system_type, "creating ACL request");
        self.post("create_acl_request", row).await
    }

    // ── Review workflow ──────────────────────────────────────────────

    /// List every stored request.
    ///
    /// `GET /acl_requests`
    pub async fn list_requests(&self) -> Result<Vec<AclRequestRecord>, Error> {
        let resp: AclRequestsResponse = self.get("acl_requests").await?;
        Ok(resp.acl_requests)
    }

    /// `GET /acl_requests/{id}`
    pub async fn get_request(&self, id: &str) -> Result<AclRequestRecord, Error> {
        let resp: AclRequestEnvelope = self.get(&format!("acl_requests/{id}")).await?;
        Ok(resp.into_record())
    }

    /// Move a request to a new status or workflow stage.
    ///
    /// `PUT /acl_requests/{id}` with `{status, comments, updated_by}`
    pub async fn update_status(
        &self,
        id: &str,
        status: &str,
        comments: &str,
        updated_by: &str,
    ) -> Result<serde_json::Value, Error> {
        debug!(id, status, "updating request status");
        self.put(
            &format!("acl_requests/{id}"),
            &StatusUpdate {
                status,
                comments,
                updated_by,
            },
        )
        .await
    }

    /// Attach a reviewer comment.
    ///
    /// `POST /acl_requests/{id}/comment` with `{comment, author, timestamp}`
    pub async fn add_comment(
        &self,
        id: &str,
        comment: &str,
        author: &str,
    ) -> Result<serde_json::Value, Error> {
        debug!(id, author, "adding comment");
        self.post(
            &format!("acl_requests/{id}/comment"),
            &CommentBody {
                comment,
                author,
                timestamp: Utc::now().to_rfc3339(),
            },
        )
        .await
    }

    // ── Help ─────────────────────────────────────────────────────────

    /// `GET /api/v1/help`, returned as-is.
    pub async fn help(&self) -> Result<serde_json::Value, Error> {
        self.get("api/v1/help").await
    }
}
