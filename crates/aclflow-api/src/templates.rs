// Template library endpoints.

use serde_json::json;
use tracing::debug;

use crate::client::AclClient;
use crate::error::Error;
use crate::models::{
    GroupedTemplatesResponse, TemplateFilter, TemplateGroup, TemplateResponse, TemplateRule,
    TemplatesResponse, UseTemplateResponse, UsedTemplate,
};

impl AclClient {
    /// Templates grouped by name, each with its rules.
    ///
    /// `GET /api/v1/templates/grouped`
    pub async fn list_template_groups(&self) -> Result<Vec<TemplateGroup>, Error> {
        let resp: GroupedTemplatesResponse = self.get("api/v1/templates/grouped").await?;
        debug!(count = resp.templates.len(), "fetched template groups");
        Ok(resp.templates)
    }

    /// Flat rule listing.
    ///
    /// `GET /api/v1/templates?system_type=&category=&requester=`. The
    /// filter is also applied locally since not every backend honours it.
    pub async fn list_templates(&self, filter: &TemplateFilter) -> Result<Vec<TemplateRule>, Error> {
        let params = filter.to_params();
        let resp: TemplatesResponse = self.get_with_params("api/v1/templates", &params).await?;

        Ok(resp
            .templates
            .into_iter()
            .filter(|t| filter.matches(t))
            .collect())
    }

    /// `GET /api/v1/templates/{id}`
    pub async fn get_template(&self, id: &str) -> Result<TemplateRule, Error> {
        let resp: TemplateResponse = self.get(&format!("api/v1/templates/{id}")).await?;
        Ok(resp.template)
    }

    /// Create a request straight from a stored template.
    ///
    /// `POST /api/v1/templates/{id}/use`
    pub async fn use_template(&self, id: &str) -> Result<UsedTemplate, Error> {
        debug!(id, "creating request from template");
        let resp: UseTemplateResponse = self
            .post(&format!("api/v1/templates/{id}/use"), &json!({}))
            .await?;
        Ok(resp.request)
    }
}
