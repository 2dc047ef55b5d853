//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;

use aclflow_api::Report;
use aclflow_core::AclRequestRow;

use crate::error::CliError;

/// Prompt for confirmation. `--yes` approves, and so does a non-interactive
/// stdin, where there is nobody to ask.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag || !std::io::stdin().is_terminal() {
        return Ok(true);
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))
}

/// Spinner on stderr, hidden in quiet mode or when stderr is not a terminal.
pub fn spinner(message: &str, quiet: bool) -> ProgressBar {
    if quiet || !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        bar.set_style(style);
    }
    bar.set_message(message.to_owned());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

// ── Rows files ──────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(untagged)]
enum RowsDocument {
    List(Vec<AclRequestRow>),
    Wrapped { requests: Vec<AclRequestRow> },
}

impl RowsDocument {
    fn into_rows(self) -> Vec<AclRequestRow> {
        match self {
            Self::List(rows) | Self::Wrapped { requests: rows } => rows,
        }
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
}

/// Read request rows from a JSON or YAML file: a list of rows, or an
/// object with a `requests` list. YAML is chosen by extension.
pub fn read_rows(path: &Path) -> Result<Vec<AclRequestRow>, CliError> {
    let text = std::fs::read_to_string(path)?;
    let invalid = |reason: String| CliError::RowsFile {
        path: path.display().to_string(),
        reason,
    };

    let doc: RowsDocument = if is_yaml(path) {
        serde_yaml::from_str(&text).map_err(|e| invalid(e.to_string()))?
    } else {
        serde_json::from_str(&text).map_err(|e| invalid(e.to_string()))?
    };
    let rows = doc.into_rows();
    if rows.is_empty() {
        return Err(invalid("no requests in file".into()));
    }
    Ok(rows)
}

// ── Reports ─────────────────────────────────────────────────────────

/// Write a downloaded report. A directory target gets the server-provided
/// file name.
pub fn save_report(report: &Report, target: &Path) -> Result<PathBuf, CliError> {
    let path = if target.is_dir() {
        target.join(&report.filename)
    } else {
        target.to_path_buf()
    };
    std::fs::write(&path, &report.bytes)?;
    tracing::info!(path = %path.display(), size = report.bytes.len(), "report saved");
    Ok(path)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;

    fn file_with(suffix: &str, body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn reads_a_json_list() {
        let file = file_with(
            ".json",
            r#"[{"system_type": "Prod", "category": "Web", "sourceIP": "10.0.0.1", "action": "allow"}]"#,
        );
        let rows = read_rows(file.path()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].source_ip, "10.0.0.1");
        assert_eq!(rows[0].action, Some(aclflow_core::Action::Allow));
    }

    #[test]
    fn reads_wrapped_yaml() {
        let file = file_with(
            ".yaml",
            "requests:\n  - system_type: Others\n    category: Lab\n    service: ssh\n",
        );
        let rows = read_rows(file.path()).unwrap();
        assert_eq!(rows[0].category, "Lab");
        assert_eq!(rows[0].service, "ssh");
    }

    #[test]
    fn empty_file_is_rejected() {
        let file = file_with(".json", "[]");
        assert!(matches!(read_rows(file.path()), Err(CliError::RowsFile { .. })));
    }

    #[test]
    fn report_into_directory_uses_server_name() {
        let dir = tempfile::tempdir().unwrap();
        let report = Report {
            filename: "batch.xlsx".into(),
            bytes: bytes::Bytes::from_static(b"PK"),
        };
        let path = save_report(&report, dir.path()).unwrap();
        assert_eq!(path, dir.path().join("batch.xlsx"));
        assert_eq!(std::fs::read(path).unwrap(), b"PK");
    }
}
