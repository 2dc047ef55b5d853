//! Batch submission of a rows file, optionally on top of a template.

use std::sync::Arc;

use tabled::Tabled;

use aclflow_api::{AclClient, SubmittedRecord};
use aclflow_core::{CoreError, FormSession, SubmitOptions};

use crate::cli::{GlobalOpts, SubmitArgs};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct RecordRow {
    #[tabled(rename = "ID")]
    id: String,
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
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Status")]
    status: String,
}

fn endpoint(ip: &str, host: &str) -> String {
    if host.is_empty() {
        ip.to_owned()
    } else {
        format!("{ip} ({host})")
    }
}

fn record_row(r: &SubmittedRecord, color: bool) -> RecordRow {
    RecordRow {
        id: r.id.clone(),
        system_type: r.system_type.clone(),
        category: r.category.clone(),
        source: endpoint(&r.source_ip, &r.source_host),
        destination: endpoint(&r.destination_ip, &r.destination_host),
        service: r.service.clone(),
        action: r.action.clone(),
        status: output::paint_status(&r.status, color),
    }
}

pub async fn handle(
    client: Arc<AclClient>,
    args: SubmitArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let rows = match args.file {
        Some(ref path) => util::read_rows(path)?,
        None => Vec::new(),
    };

    let session = FormSession::open(client, false).await?;
    if let Some(ref name) = args.template {
        session
            .load_template_named(name)
            .await
            .map_err(|e| match e {
                CoreError::NotFound { .. } => CliError::NotFound {
                    resource_type: "template".into(),
                    identifier: name.clone(),
                    list_command: "templates list --grouped".into(),
                },
                other => other.into(),
            })?;
    }
    session.append_rows(&rows).await?;

    let count = session.snapshot().await.len();
    if !util::confirm(&format!("Submit {count} request(s)?"), global.yes)? {
        session.close().await;
        eprintln!("Aborted.");
        return Ok(());
    }

    let spinner = util::spinner(&format!("Submitting {count} request(s)..."), global.quiet);
    let options = SubmitOptions {
        requester: args.requester.clone(),
        download_report: !args.no_report,
    };
    let result = session.submit_all(&options).await;
    spinner.finish_and_clear();
    session.close().await;
    let submission = result?;

    let color = output::should_color(&global.color);
    let out = output::render_list(
        &global.output,
        &submission.records,
        |r| record_row(r, color),
        |r| r.id.clone(),
    );
    output::print_output(&out, global.quiet);

    match submission.report {
        Some(ref report) => {
            let path = util::save_report(report, &args.report_dir)?;
            if !global.quiet {
                eprintln!("✓ Report saved to {}", path.display());
            }
        }
        None if !args.no_report => {
            eprintln!("Requests were submitted, but the report could not be downloaded.");
        }
        None => {}
    }
    Ok(())
}
