//! Offline validation: single values and whole rows files.

use serde::Serialize;
use tabled::Tabled;

use aclflow_core::{
    AclRequestRow, FieldErrors, ValidationErrorSet, Verdict, check_required, validate_acl_request,
    validate_description, validate_ip, validate_service,
};

use crate::cli::{CheckArgs, CheckCommand, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Row report ──────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct RowReport {
    /// 1-based.
    row: usize,
    valid: bool,
    errors: FieldErrors,
}

#[derive(Tabled)]
struct RowReportRow {
    #[tabled(rename = "#")]
    row: usize,
    #[tabled(rename = "Result")]
    result: String,
    #[tabled(rename = "Errors")]
    errors: String,
}

fn report_row(r: &RowReport, color: bool) -> RowReportRow {
    RowReportRow {
        row: r.row,
        result: output::verdict_mark(r.valid, color),
        errors: r
            .errors
            .iter()
            .map(|(field, msg)| format!("{field}: {msg}"))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// Field grammar plus the required-field check for one row.
fn check_row(number: usize, row: &AclRequestRow) -> RowReport {
    let mut errors = validate_acl_request(row).errors;
    if let Err(issue) = check_required(number, row) {
        errors.entry(issue.field.to_string()).or_insert(issue.message);
    }
    RowReport {
        row: number,
        valid: errors.is_empty(),
        errors,
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: CheckArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let (field, verdict) = match args.command {
        CheckCommand::Ip { value } => ("ip", validate_ip(&value)),
        CheckCommand::Service { value } => ("service", validate_service(&value)),
        CheckCommand::Description { value } => ("description", validate_description(&value)),
        CheckCommand::Rows { file } => return check_rows(&file, global),
    };
    report_verdict(field, &verdict, global)
}

fn report_verdict(field: &str, verdict: &Verdict, global: &GlobalOpts) -> Result<(), CliError> {
    let structured = !matches!(global.output, OutputFormat::Table | OutputFormat::Plain);
    if verdict.valid || structured {
        let color = output::should_color(&global.color);
        let out = output::render_single(
            &global.output,
            verdict,
            |v| output::verdict_mark(v.valid, color),
            |v| output::verdict_mark(v.valid, false),
        );
        output::print_output(&out, global.quiet);
    }
    if verdict.valid {
        Ok(())
    } else {
        Err(CliError::Validation {
            field: field.into(),
            reason: verdict.error.clone(),
        })
    }
}

fn check_rows(file: &std::path::Path, global: &GlobalOpts) -> Result<(), CliError> {
    let rows = util::read_rows(file)?;
    let reports: Vec<RowReport> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| check_row(i + 1, row))
        .collect();

    let color = output::should_color(&global.color);
    let out = output::render_list(
        &global.output,
        &reports,
        |r| report_row(r, color),
        |r| format!("{}\t{}", r.row, output::verdict_mark(r.valid, false)),
    );
    output::print_output(&out, global.quiet);

    let mut invalid = ValidationErrorSet::new();
    for r in reports.iter().filter(|r| !r.valid) {
        invalid.set_row(r.row - 1, r.errors.clone());
    }
    if invalid.is_empty() {
        Ok(())
    } else {
        Err(CliError::InvalidRows {
            count: invalid.len(),
            details: invalid.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aclflow_core::Action;

    fn row() -> AclRequestRow {
        AclRequestRow {
            system_type: "Prod".into(),
            category: "Web".into(),
            source_ip: "10.0.0.1".into(),
            destination_ip: "10.0.0.0/24".into(),
            service: "https".into(),
            description: "web tier".into(),
            action: Some(Action::Allow),
            ..AclRequestRow::default()
        }
    }

    #[test]
    fn complete_row_passes() {
        let report = check_row(1, &row());
        assert!(report.valid, "{:?}", report.errors);
    }

    #[test]
    fn grammar_and_required_errors_are_combined() {
        let mut bad = row();
        bad.service = "tcp/99999".into();
        bad.action = None;
        let report = check_row(3, &bad);
        assert!(!report.valid);
        assert!(report.errors.contains_key("service"));
        assert_eq!(
            report.errors.get("action").map(String::as_str),
            Some("Please select Action in Request #3")
        );
    }
}
