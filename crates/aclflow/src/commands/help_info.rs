//! Backend help content.

use std::sync::Arc;

use aclflow_api::AclClient;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

/// The backend's help document is free-form JSON; the table view prints
/// top-level strings as sections and everything else as pretty JSON.
fn render_help(help: &serde_json::Value) -> String {
    let Some(map) = help.as_object() else {
        return output::render_json_pretty(help);
    };
    map.iter()
        .map(|(key, value)| match value {
            serde_json::Value::String(text) => format!("{key}\n  {text}"),
            other => format!("{key}\n{}", output::render_json_pretty(other)),
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub async fn handle(client: &Arc<AclClient>, global: &GlobalOpts) -> Result<(), CliError> {
    let help = client.help().await?;
    let out = output::render_single(&global.output, &help, render_help, |h| {
        h.as_object()
            .map(|m| m.keys().cloned().collect::<Vec<_>>().join("\n"))
            .unwrap_or_default()
    });
    output::print_output(&out, global.quiet);
    Ok(())
}
