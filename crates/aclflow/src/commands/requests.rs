//! Reviewer commands over stored requests.

use std::sync::Arc;

use strum::IntoEnumIterator;
use tabled::Tabled;

use aclflow_api::{AclClient, AclRequestRecord};
use aclflow_core::{RequestFilter, ReviewDesk, WorkflowStage, WorkflowSummary};

use crate::cli::{GlobalOpts, RequestsArgs, RequestsCommand};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct RequestRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Requester")]
    requester: String,
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
    #[tabled(rename = "Status")]
    status: String,
}

fn request_row(r: &AclRequestRecord, color: bool) -> RequestRow {
    RequestRow {
        id: r.id.to_string(),
        requester: r.requester.clone(),
        system_type: r.system_type.clone(),
        category: r.category.clone(),
        source: r.source_ip.clone(),
        destination: r.destination_ip.clone(),
        service: r.service.clone(),
        status: output::paint_status(&r.status, color),
    }
}

fn detail(r: &AclRequestRecord, color: bool) -> String {
    let mut text = output::detail_lines(&[
        ("ID", r.id.to_string()),
        ("Requester", r.requester.clone()),
        ("Status", output::paint_status(&r.status, color)),
        ("System Type", r.system_type.clone()),
        ("Category", r.category.clone()),
        ("Source IP", r.source_ip.clone()),
        ("Source Host", r.source_host.clone()),
        ("Destination IP", r.destination_ip.clone()),
        ("Destination Host", r.destination_host.clone()),
        ("Service", r.service.clone()),
        ("Reason", r.reason.clone()),
        ("Created", r.created_at.clone().unwrap_or_default()),
        (
            "Template",
            r.template_id.as_ref().map(ToString::to_string).unwrap_or_default(),
        ),
    ]);
    if !r.comments.is_empty() {
        text.push_str("\n\nComments:");
        for c in &r.comments {
            let when = c.timestamp.as_deref().unwrap_or("");
            text.push_str(&format!("\n  [{when}] {}: {}", c.author, c.comment));
        }
    }
    text
}

fn summary_detail(s: &WorkflowSummary) -> String {
    output::detail_lines(&[
        ("Total", s.total.to_string()),
        ("Pending", s.pending.to_string()),
        ("In Approval", s.in_approval.to_string()),
        ("Approved", s.approved.to_string()),
        ("Rejected", s.rejected.to_string()),
    ])
}

fn parse_stage(raw: &str) -> Result<WorkflowStage, CliError> {
    raw.parse().map_err(|e: aclflow_core::UnknownStage| {
        let known: Vec<String> = WorkflowStage::iter().map(|s| s.to_string()).collect();
        CliError::Validation {
            field: "stage".into(),
            reason: format!("{e}; expected one of: {}", known.join(", ")),
        }
    })
}

pub async fn handle(
    client: Arc<AclClient>,
    args: RequestsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let desk = ReviewDesk::new(client);
    let color = output::should_color(&global.color);

    match args.command {
        RequestsCommand::List { summary: true, .. } => {
            let summary = desk.summary().await?;
            let out = output::render_single(&global.output, &summary, summary_detail, |s| {
                s.total.to_string()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        RequestsCommand::List {
            status,
            category,
            system_type,
            summary: false,
        } => {
            let filter = RequestFilter {
                status,
                category,
                system_type,
            };
            let records = desk.list(&filter).await?;
            let out = output::render_list(
                &global.output,
                &records,
                |r| request_row(r, color),
                |r| r.id.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        RequestsCommand::Get { id } => {
            let record = desk.get(&id).await?;
            let out = output::render_single(
                &global.output,
                &record,
                |r| detail(r, color),
                |r| r.id.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        RequestsCommand::Stage { id, stage, comment } => {
            let stage = parse_stage(&stage)?;
            let resp = desk.move_to(&id, stage, &comment).await?;
            let out = output::render_single(
                &global.output,
                &resp,
                |_| format!("✓ Request {id} moved to {stage}"),
                |_| id.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        RequestsCommand::Comment { id, text } => {
            let resp = desk.comment(&id, &text).await?;
            let out = output::render_single(
                &global.output,
                &resp,
                |_| format!("✓ Comment added to request {id}"),
                |_| id.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_names_are_lenient() {
        assert_eq!(parse_stage("under-review").ok(), Some(WorkflowStage::UnderReview));
        assert_eq!(parse_stage("Rejected").ok(), Some(WorkflowStage::Rejected));
    }

    #[test]
    fn unknown_stage_lists_choices() {
        let Err(CliError::Validation { field, reason }) = parse_stage("shipped") else {
            panic!("expected a validation error");
        };
        assert_eq!(field, "stage");
        assert!(reason.contains("Security Approval"));
    }
}
