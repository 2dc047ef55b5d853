// ── Templates ──

use serde::Serialize;

use aclflow_api::{TemplateGroup, TemplateRule};

use super::row::{AclRequestRow, TEMPLATE, TemplateOrigin};

/// A named bundle of pre-filled rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Template {
    pub name: String,
    pub created_by: Option<String>,
    pub created_at: Option<String>,
    pub rules: Vec<TemplateRule>,
}

impl From<TemplateGroup> for Template {
    fn from(group: TemplateGroup) -> Self {
        Self {
            name: group.template_name,
            created_by: group.created_by,
            created_at: group.created_at,
            rules: group.rules,
        }
    }
}

impl From<TemplateRule> for Template {
    fn from(rule: TemplateRule) -> Self {
        Self {
            name: rule.template_name.clone(),
            created_by: rule.created_by.clone(),
            created_at: rule.created_at.clone(),
            rules: vec![rule],
        }
    }
}

impl Template {
    /// One form row per rule, tagged with this template's name. The rule's
    /// own system type is kept on the origin and the row is marked
    /// [`TEMPLATE`].
    pub fn rows(&self) -> Vec<AclRequestRow> {
        self.rules
            .iter()
            .map(|rule| AclRequestRow {
                system_type: TEMPLATE.to_owned(),
                category: rule.category.clone(),
                source_ip: rule.source_ip.clone(),
                source_host: rule.source_host.clone(),
                destination_ip: rule.destination_ip.clone(),
                destination_host: rule.destination_host.clone(),
                service: rule.service.clone(),
                description: rule.description.clone(),
                action: rule.action.as_deref().and_then(|a| a.trim().parse().ok()),
                template_origin: Some(TemplateOrigin {
                    template_name: self.name.clone(),
                    original_system_type: rule.system_type.clone(),
                }),
                ..AclRequestRow::default()
            })
            .collect()
    }
}
