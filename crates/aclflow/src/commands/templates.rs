//! Template library commands.

use std::sync::Arc;

use tabled::Tabled;

use aclflow_api::{AclClient, TemplateFilter, TemplateRule};
use aclflow_core::{CoreError, Template};

use crate::cli::{GlobalOpts, TemplatesArgs, TemplatesCommand};
use crate::error::CliError;
use crate::output;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct RuleRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Template")]
    template: String,
    #[tabled(rename = "System Type")]
    system_type: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Destination")]
    destination: String,
    #[tabled(rename = "Service")]
    service: String,
}

impl From<&TemplateRule> for RuleRow {
    fn from(r: &TemplateRule) -> Self {
        Self {
            id: rule_id(r),
            template: r.template_name.clone(),
            system_type: r.system_type.clone(),
            category: r.category.clone(),
            source: r.source_ip.clone(),
            destination: r.destination_ip.clone(),
            service: r.service.clone(),
        }
    }
}

#[derive(Tabled)]
struct TemplateRow {
    #[tabled(rename = "Template")]
    name: String,
    #[tabled(rename = "Rules")]
    rules: usize,
    #[tabled(rename = "Created By")]
    created_by: String,
    #[tabled(rename = "Created")]
    created_at: String,
}

impl From<&Template> for TemplateRow {
    fn from(t: &Template) -> Self {
        Self {
            name: t.name.clone(),
            rules: t.rules.len(),
            created_by: t.created_by.clone().unwrap_or_default(),
            created_at: t.created_at.clone().unwrap_or_default(),
        }
    }
}

fn rule_id(r: &TemplateRule) -> String {
    r.id.as_ref().map(ToString::to_string).unwrap_or_default()
}

fn detail(r: &TemplateRule) -> String {
    output::detail_lines(&[
        ("ID", rule_id(r)),
        ("Template", r.template_name.clone()),
        ("Requester", r.requester.clone().unwrap_or_default()),
        ("System Type", r.system_type.clone()),
        ("Category", r.category.clone()),
        ("Source IP", r.source_ip.clone()),
        ("Source Host", r.source_host.clone()),
        ("Destination IP", r.destination_ip.clone()),
        ("Destination Host", r.destination_host.clone()),
        ("Service", r.service.clone()),
        ("Description", r.description.clone()),
        ("Action", r.action.clone().unwrap_or_default()),
        ("Status", r.status.clone().unwrap_or_default()),
        ("Created By", r.created_by.clone().unwrap_or_default()),
        ("Created", r.created_at.clone().unwrap_or_default()),
    ])
}

fn not_found(id: String) -> impl FnOnce(CoreError) -> CliError {
    move |e| match e {
        CoreError::NotFound { .. } => CliError::NotFound {
            resource_type: "template".into(),
            identifier: id,
            list_command: "templates list".into(),
        },
        other => other.into(),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    client: &Arc<AclClient>,
    args: TemplatesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        TemplatesCommand::List {
            grouped: true,
            system_type,
            category,
            requester,
        } => {
            let filter = TemplateFilter {
                system_type,
                category,
                requester,
            };
            let templates: Vec<Template> = client
                .list_template_groups()
                .await?
                .into_iter()
                .map(Template::from)
                .filter(|t| t.rules.is_empty() || t.rules.iter().any(|r| filter.matches(r)))
                .collect();
            let out = output::render_list(
                &global.output,
                &templates,
                |t| TemplateRow::from(t),
                |t| t.name.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        TemplatesCommand::List {
            grouped: false,
            system_type,
            category,
            requester,
        } => {
            let filter = TemplateFilter {
                system_type,
                category,
                requester,
            };
            let rules = client.list_templates(&filter).await?;
            let out = output::render_list(&global.output, &rules, |r| RuleRow::from(r), rule_id);
            output::print_output(&out, global.quiet);
            Ok(())
        }

        TemplatesCommand::Get { id } => {
            let rule = client
                .get_template(&id)
                .await
                .map_err(|e| not_found(id)(e.into()))?;
            let out = output::render_single(&global.output, &rule, detail, rule_id);
            output::print_output(&out, global.quiet);
            Ok(())
        }

        TemplatesCommand::Use { id } => {
            let created = client
                .use_template(&id)
                .await
                .map_err(|e| not_found(id)(e.into()))?;
            let out = output::render_single(
                &global.output,
                &created,
                |c| {
                    format!(
                        "✓ Created request {} from template '{}' ({})",
                        c.id, c.template_name, c.status
                    )
                },
                |c| c.id.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
