// ── Validation error set ──

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use aclflow_api::ValidationResponse;

/// Field name to message, for one row.
pub type FieldErrors = BTreeMap<String, String>;

/// Row index (0-based) to field errors. Rows without errors are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrorSet(BTreeMap<usize, FieldErrors>);

impl ValidationErrorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a backend verdict, keeping only invalid rows below `row_count`.
    pub fn from_response(resp: &ValidationResponse, row_count: usize) -> Self {
        let mut set = Self::new();
        for result in &resp.validation_results {
            if result.valid || result.errors.is_empty() || result.row_index >= row_count {
                continue;
            }
            set.0.insert(result.row_index, result.errors.clone());
        }
        set
    }

    pub fn insert(&mut self, row: usize, field: impl Into<String>, message: impl Into<String>) {
        self.0
            .entry(row)
            .or_default()
            .insert(field.into(), message.into());
    }

    pub fn set_row(&mut self, row: usize, errors: FieldErrors) {
        if errors.is_empty() {
            self.0.remove(&row);
        } else {
            self.0.insert(row, errors);
        }
    }

    pub fn row(&self, row: usize) -> Option<&FieldErrors> {
        self.0.get(&row)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of rows with at least one error.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Total number of field errors across all rows.
    pub fn error_count(&self) -> usize {
        self.0.values().map(BTreeMap::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &FieldErrors)> {
        self.0.iter().map(|(row, errs)| (*row, errs))
    }
}

impl fmt::Display for ValidationErrorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row, errors) in &self.0 {
            writeln!(f, "Request #{}:", row + 1)?;
            for (field, message) in errors {
                writeln!(f, "  {field}: {message}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use aclflow_api::RowValidationResult;

    #[test]
    fn from_response_keeps_only_invalid_rows() {
        let resp = ValidationResponse {
            valid: false,
            validation_results: vec![
                RowValidationResult {
                    row_index: 0,
                    valid: true,
                    errors: BTreeMap::new(),
                },
                RowValidationResult {
                    row_index: 1,
                    valid: false,
                    errors: BTreeMap::from([("service".into(), "bad".into())]),
                },
                RowValidationResult {
                    row_index: 9,
                    valid: false,
                    errors: BTreeMap::from([("service".into(), "stale".into())]),
                },
            ],
            error_count: 2,
        };

        let set = ValidationErrorSet::from_response(&resp, 2);
        assert_eq!(set.len(), 1);
        assert!(set.row(0).is_none());
        assert_eq!(set.row(1).unwrap().get("service").unwrap(), "bad");
        assert_eq!(set.to_string(), "Request #2:\n  service: bad\n");
    }

    #[test]
    fn set_row_with_no_errors_removes_entry() {
        let mut set = ValidationErrorSet::new();
        set.insert(0, "sourceIP", "x");
        set.insert(0, "service", "y");
        assert_eq!(set.error_count(), 2);
        set.set_row(0, FieldErrors::new());
        assert!(set.is_empty());
    }
}
