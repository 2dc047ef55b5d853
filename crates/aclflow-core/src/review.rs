// ── Reviewer desk ──
//
// Thin orchestration over the stored-request endpoints: filtering,
// dashboard counters, stage moves and comments. Stage transitions are
// decided by the backend; the client only refuses to move a request that
// already reached a terminal stage.

use std::sync::Arc;

use tracing::info;

use aclflow_api::{AclClient, AclRequestRecord};

use crate::error::CoreError;
use crate::model::{RequestFilter, WorkflowStage, WorkflowSummary};

/// Name recorded on updates when nobody is logged in.
const FALLBACK_REVIEWER: &str = "Reviewer";

pub struct ReviewDesk {
    client: Arc<AclClient>,
}

impl ReviewDesk {
    pub fn new(client: Arc<AclClient>) -> Self {
        Self { client }
    }

    fn reviewer(&self) -> String {
        self.client
            .session()
            .user()
            .map(|u| u.username)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| FALLBACK_REVIEWER.to_owned())
    }

    pub async fn list(&self, filter: &RequestFilter) -> Result<Vec<AclRequestRecord>, CoreError> {
        let records = self.client.list_requests().await?;
        Ok(filter.apply(&records).into_iter().cloned().collect())
    }

    pub async fn summary(&self) -> Result<WorkflowSummary, CoreError> {
        let records = self.client.list_requests().await?;
        Ok(WorkflowSummary::from_records(&records))
    }

    pub async fn get(&self, id: &str) -> Result<AclRequestRecord, CoreError> {
        Ok(self.client.get_request(id).await?)
    }

    /// Move a request to `stage`, recording `comment` with the update.
    pub async fn move_to(
        &self,
        id: &str,
        stage: WorkflowStage,
        comment: &str,
    ) -> Result<serde_json::Value, CoreError> {
        let current = self.client.get_request(id).await?;
        if let Ok(now) = current.status.parse::<WorkflowStage>() {
            if now.is_terminal() && now != stage {
                return Err(CoreError::Api {
                    message: format!("request {id} is already {now}"),
                    status: None,
                });
            }
        }

        let reviewer = self.reviewer();
        let resp = self
            .client
            .update_status(id, &stage.to_string(), comment, &reviewer)
            .await?;
        info!(id, stage = %stage, reviewer, "request moved");
        Ok(resp)
    }

    pub async fn comment(&self, id: &str, text: &str) -> Result<serde_json::Value, CoreError> {
        let author = self.reviewer();
        Ok(self.client.add_comment(id, text, &author).await?)
    }
}
