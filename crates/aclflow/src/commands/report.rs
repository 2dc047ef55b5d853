//! Spreadsheet export of every visible request.

use std::path::Path;
use std::sync::Arc;

use aclflow_api::AclClient;

use crate::cli::{GlobalOpts, ReportArgs};
use crate::error::CliError;

use super::util;

pub async fn handle(
    client: &Arc<AclClient>,
    args: ReportArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let spinner = util::spinner("Generating report...", global.quiet);
    let report = client.download_report().await;
    spinner.finish_and_clear();
    let report = report?;

    let target = args.out.as_deref().unwrap_or_else(|| Path::new("."));
    let path = util::save_report(&report, target)?;
    if !global.quiet {
        eprintln!("✓ Report saved to {}", path.display());
    }
    Ok(())
}
