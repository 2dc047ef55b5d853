// ── Multi-row request form ──
//
// Synchronous state machine behind the request editor. Each row carries
// its own auto-populated markers, field errors, and touched set; nothing
// is kept in parallel arrays. Backend lookups are not performed here:
// `update_field` hands back a `LookupRequest` and the caller feeds the
// answer into `apply_lookup`.

use std::collections::BTreeSet;

use serde::Serialize;
use strum::Display;
use tracing::{debug, trace};

use aclflow_api::{
    AutoPopulateMatch, AutoPopulateQuery, CategoryOption, EndpointOption, RecordId,
    ValidationResponse,
};

use crate::error::CoreError;
use crate::model::{
    AclRequestRow, Direction, FieldErrors, OptionCatalog, PairedEndpoint, RowField, Template,
    ValidationErrorSet,
};
use crate::validate::validate_field;

/// Stable identity of a row, independent of its position.
pub type RowId = u64;

// ── Per-row state ────────────────────────────────────────────────────

/// Which fields were filled by matching rather than typed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AutoFlags {
    pub source_ip: bool,
    pub source_host: bool,
    pub destination_ip: bool,
    pub destination_host: bool,
    pub service: bool,
    pub description: bool,
}

impl AutoFlags {
    pub fn get(&self, field: RowField) -> bool {
        match field {
            RowField::SourceIp => self.source_ip,
            RowField::SourceHost => self.source_host,
            RowField::DestinationIp => self.destination_ip,
            RowField::DestinationHost => self.destination_host,
            RowField::Service => self.service,
            RowField::Description => self.description,
            _ => false,
        }
    }

    pub fn set(&mut self, field: RowField, on: bool) {
        match field {
            RowField::SourceIp => self.source_ip = on,
            RowField::SourceHost => self.source_host = on,
            RowField::DestinationIp => self.destination_ip = on,
            RowField::DestinationHost => self.destination_host = on,
            RowField::Service => self.service = on,
            RowField::Description => self.description = on,
            _ => {}
        }
    }

    /// Flags after a catalog pairing copy from `direction`.
    fn paired(direction: Direction, has_pair: bool) -> Self {
        Self {
            source_ip: direction == Direction::Destination && has_pair,
            source_host: true,
            destination_ip: direction == Direction::Source && has_pair,
            destination_host: true,
            service: true,
            description: true,
        }
    }

    pub fn any(&self) -> bool {
        RowField::AUTO_FILLABLE.iter().any(|f| self.get(*f))
    }
}

/// Informal per-row lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RowStage {
    #[default]
    Empty,
    PartiallyFilled,
    LocallyValid,
    LocallyInvalid,
    RemotelyValid,
    RemotelyInvalid,
    Submitted,
}

/// A row together with its UI bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowState {
    pub id: RowId,
    pub row: AclRequestRow,
    pub auto: AutoFlags,
    pub errors: FieldErrors,
    pub touched: BTreeSet<RowField>,
    pub stage: RowStage,
    #[serde(skip)]
    generation: u64,
    /// Fields edited since the last lookup was issued. A lookup answer
    /// never overwrites them.
    #[serde(skip)]
    edited_since_lookup: BTreeSet<RowField>,
}

impl RowState {
    fn new(id: RowId, row: AclRequestRow) -> Self {
        let mut state = Self {
            id,
            row,
            auto: AutoFlags::default(),
            errors: FieldErrors::new(),
            touched: BTreeSet::new(),
            stage: RowStage::Empty,
            generation: 0,
            edited_since_lookup: BTreeSet::new(),
        };
        state.refresh_stage();
        state
    }

    fn is_blank(&self) -> bool {
        let r = &self.row;
        [
            &r.system_type,
            &r.category,
            &r.source_ip,
            &r.source_host,
            &r.destination_ip,
            &r.destination_host,
            &r.service,
            &r.description,
        ]
        .iter()
        .all(|s| s.is_empty())
            && r.action.is_none()
    }

    fn refresh_stage(&mut self) {
        self.stage = if self.is_blank() {
            RowStage::Empty
        } else {
            RowStage::PartiallyFilled
        };
    }

    /// Copy a catalog endpoint (and its pair, if any) into the row.
    fn apply_pairing(
        &mut self,
        direction: Direction,
        selected: &EndpointOption,
        paired: Option<&EndpointOption>,
    ) {
        let row = &mut self.row;
        row.set(direction.ip_field(), &selected.value);
        row.set(direction.host_field(), &selected.host);
        row.set_option_id(direction, Some(selected.id.clone()));

        let other = direction.opposite();
        if let Some(p) = paired {
            row.set(other.ip_field(), &p.value);
            row.set(other.host_field(), &p.host);
            row.set_option_id(other, Some(p.id.clone()));
        }

        row.service.clone_from(&selected.service);
        row.description.clone_from(&selected.description);

        self.auto = AutoFlags::paired(direction, paired.is_some());
        self.errors.clear();
    }
}

// ── Lookups ──────────────────────────────────────────────────────────

/// Identifies an outstanding backend lookup. A completion whose ticket no
/// longer matches the row is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupTicket {
    pub row_id: RowId,
    pub direction: Direction,
    pub generation: u64,
}

/// A backend auto-populate call the caller should issue.
#[derive(Debug, Clone)]
pub struct LookupRequest {
    pub ticket: LookupTicket,
    pub query: AutoPopulateQuery,
}

/// First structural problem found before any network call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalIssue {
    /// 1-based row number.
    pub row: usize,
    pub field: RowField,
    pub message: String,
}

impl From<LocalIssue> for CoreError {
    fn from(issue: LocalIssue) -> Self {
        CoreError::LocalValidation {
            row: issue.row,
            field: issue.field,
            message: issue.message,
        }
    }
}

// ── Form ─────────────────────────────────────────────────────────────

/// The ordered rows of one request form. Never empty.
#[derive(Debug, Clone, Serialize)]
pub struct RequestForm {
    rows: Vec<RowState>,
    #[serde(skip)]
    next_id: RowId,
}

impl Default for RequestForm {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestForm {
    /// A form holding one blank row.
    pub fn new() -> Self {
        Self {
            rows: vec![RowState::new(0, AclRequestRow::default())],
            next_id: 1,
        }
    }

    /// A form holding `rows` as-is, without field side effects. An empty
    /// list gives one blank row.
    pub fn from_rows(rows: Vec<AclRequestRow>) -> Self {
        let mut form = Self::new();
        if rows.is_empty() {
            return form;
        }
        form.rows.clear();
        for row in rows {
            form.push_row(row);
        }
        form
    }

    fn alloc_id(&mut self) -> RowId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Always `false`; kept for symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[RowState] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Result<&RowState, CoreError> {
        self.rows.get(index).ok_or(CoreError::RowOutOfRange {
            index,
            len: self.rows.len(),
        })
    }

    fn row_mut(&mut self, index: usize) -> Result<&mut RowState, CoreError> {
        let len = self.rows.len();
        self.rows
            .get_mut(index)
            .ok_or(CoreError::RowOutOfRange { index, len })
    }

    pub fn index_of(&self, id: RowId) -> Option<usize> {
        self.rows.iter().position(|r| r.id == id)
    }

    // ── Row list ─────────────────────────────────────────────────────

    /// Append a blank row and return its index.
    pub fn add_row(&mut self) -> usize {
        let id = self.alloc_id();
        self.rows.push(RowState::new(id, AclRequestRow::default()));
        self.rows.len() - 1
    }

    /// Append a pre-filled row without running field side effects.
    pub fn push_row(&mut self, row: AclRequestRow) -> usize {
        let id = self.alloc_id();
        self.rows.push(RowState::new(id, row));
        self.rows.len() - 1
    }

    /// Remove a row. Returns `false` (and does nothing) when it is the last
    /// one or the index is out of range.
    pub fn remove_row(&mut self, index: usize) -> bool {
        if self.rows.len() <= 1 || index >= self.rows.len() {
            return false;
        }
        let removed = self.rows.remove(index);
        debug!(row = index, id = removed.id, "removed row");
        true
    }

    /// Back to a single blank row.
    pub fn reset(&mut self) {
        let id = self.alloc_id();
        self.rows = vec![RowState::new(id, AclRequestRow::default())];
    }

    /// Replace every row with the template's rules. A template without
    /// rules leaves the form untouched and returns `false`.
    pub fn load_template(&mut self, template: &Template) -> bool {
        let rows = template.rows();
        if rows.is_empty() {
            return false;
        }
        self.rows.clear();
        for row in rows {
            let id = self.alloc_id();
            self.rows.push(RowState::new(id, row));
        }
        debug!(template = %template.name, rows = self.rows.len(), "loaded template");
        true
    }

    // ── Field edits ──────────────────────────────────────────────────

    /// Set a field and apply its side effects (catalog pairing, flag and
    /// error housekeeping). Returns a lookup to issue when a typed IP
    /// matched nothing in the catalog.
    pub fn update_field(
        &mut self,
        catalog: &OptionCatalog,
        index: usize,
        field: RowField,
        value: &str,
    ) -> Result<Option<LookupRequest>, CoreError> {
        let state = self.row_mut(index)?;
        let old = state.row.get(field);
        state.row.set(field, value);
        state.errors.remove(&field.to_string());
        state.edited_since_lookup.insert(field);
        state.refresh_stage();
        trace!(row = index, field = %field, "field updated");

        let changed = old != value;
        let mut lookup = None;

        match field {
            RowField::SystemType if changed => {
                state.errors.clear();
                state.generation += 1;
            }
            RowField::Category if changed && !state.row.has_free_category() => {
                state.errors.clear();
                state.generation += 1;
                if let Err(issue) = check_category(index + 1, &state.row, catalog) {
                    state.errors.insert(issue.field.to_string(), issue.message);
                }
            }
            RowField::SourceIp | RowField::DestinationIp if !state.row.is_others() => {
                let direction = if field == RowField::SourceIp {
                    Direction::Source
                } else {
                    Direction::Destination
                };
                state.generation += 1;

                let matched = catalog
                    .endpoints_for(direction, &state.row.system_type, &state.row.category)
                    .into_iter()
                    .find(|p| p.endpoint.value == value);

                if let Some(m) = matched {
                    debug!(row = index, %direction, id = %m.endpoint.id, "catalog match");
                    state.apply_pairing(direction, &m.endpoint, m.paired.as_ref());
                } else {
                    state.row.set_option_id(direction, None);
                    state.row.set(direction.host_field(), "");
                    state.auto.source_host = false;
                    state.auto.destination_host = false;
                    state.auto.service = false;
                    state.auto.description = false;

                    let row = &state.row;
                    if !value.trim().is_empty()
                        && !row.system_type.is_empty()
                        && !row.category.is_empty()
                        && !row.has_free_category()
                    {
                        let mut query = AutoPopulateQuery {
                            system_type: row.system_type.clone(),
                            category: row.category.clone(),
                            ..AutoPopulateQuery::default()
                        };
                        match direction {
                            Direction::Source => value.clone_into(&mut query.source_ip),
                            Direction::Destination => value.clone_into(&mut query.destination_ip),
                        }
                        lookup = Some(LookupRequest {
                            ticket: LookupTicket {
                                row_id: state.id,
                                direction,
                                generation: state.generation,
                            },
                            query,
                        });
                    }
                }
            }
            RowField::SourceOptionId | RowField::DestinationOptionId
                if !value.is_empty() && !state.row.is_others() =>
            {
                let direction = if field == RowField::SourceOptionId {
                    Direction::Source
                } else {
                    Direction::Destination
                };
                let id = RecordId::new(value);
                if let Some(selected) = catalog.find(direction, &id) {
                    let paired = catalog.find(direction.opposite(), &id);
                    state.generation += 1;
                    state.apply_pairing(direction, selected, paired);
                }
            }
            _ => {}
        }

        if field.is_auto_fillable() {
            state.auto.set(field, false);
        }
        if lookup.is_some() {
            state.edited_since_lookup.clear();
        }

        Ok(lookup)
    }

    /// Merge a backend lookup answer. Empty values and fields typed after the
    /// lookup was issued are never overwritten. Returns `false` when the
    /// ticket is stale (row removed or its context edited since).
    pub fn apply_lookup(&mut self, ticket: LookupTicket, found: &AutoPopulateMatch) -> bool {
        let Some(state) = self.rows.iter_mut().find(|r| r.id == ticket.row_id) else {
            debug!(id = ticket.row_id, "lookup for removed row discarded");
            return false;
        };
        if state.generation != ticket.generation {
            debug!(id = ticket.row_id, "stale lookup discarded");
            return false;
        }

        let typed = ticket.direction.ip_field();
        let updates = [
            (RowField::SourceIp, &found.source_ip),
            (RowField::SourceHost, &found.source_host),
            (RowField::DestinationIp, &found.destination_ip),
            (RowField::DestinationHost, &found.destination_host),
            (RowField::Service, &found.service),
            (RowField::Description, &found.description),
        ];
        for (field, value) in updates {
            let Some(value) = value.as_deref().filter(|v| !v.is_empty()) else {
                continue;
            };
            if state.edited_since_lookup.contains(&field) {
                continue;
            }
            state.row.set(field, value);
            if field != typed {
                state.auto.set(field, true);
            }
        }
        state.refresh_stage();
        true
    }

    /// Mark a field touched and run its grammar check. Rows under "Others"
    /// are only marked.
    pub fn touch_field(&mut self, index: usize, field: RowField) -> Result<(), CoreError> {
        let state = self.row_mut(index)?;
        state.touched.insert(field);
        if state.row.is_others() {
            return Ok(());
        }

        let value = state.row.get(field);
        if field == RowField::Description && value.trim().is_empty() {
            return Ok(());
        }
        if let Some(verdict) = validate_field(field, &value) {
            if verdict.valid {
                state.errors.remove(&field.to_string());
            } else {
                state.errors.insert(field.to_string(), verdict.error);
            }
        }
        Ok(())
    }

    // ── Derived views ────────────────────────────────────────────────

    pub fn filtered_categories(
        &self,
        catalog: &OptionCatalog,
        index: usize,
    ) -> Result<Vec<CategoryOption>, CoreError> {
        let row = &self.row(index)?.row;
        Ok(catalog
            .categories_for(&row.system_type)
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn filtered_source_endpoints(
        &self,
        catalog: &OptionCatalog,
        index: usize,
    ) -> Result<Vec<PairedEndpoint>, CoreError> {
        let row = &self.row(index)?.row;
        Ok(catalog.endpoints_for(Direction::Source, &row.system_type, &row.category))
    }

    pub fn filtered_destination_endpoints(
        &self,
        catalog: &OptionCatalog,
        index: usize,
    ) -> Result<Vec<PairedEndpoint>, CoreError> {
        let row = &self.row(index)?.row;
        Ok(catalog.endpoints_for(Direction::Destination, &row.system_type, &row.category))
    }

    /// Picker suggestions for a free-text field.
    pub fn suggestions(
        &self,
        catalog: &OptionCatalog,
        index: usize,
        field: RowField,
    ) -> Result<Vec<String>, CoreError> {
        let row = &self.row(index)?.row;
        if row.is_others() {
            return Ok(Vec::new());
        }
        let values = |direction: Direction, host: bool| {
            let mut out: Vec<String> = Vec::new();
            for p in catalog.endpoints_for(direction, &row.system_type, &row.category) {
                let v = if host { p.endpoint.host } else { p.endpoint.value };
                if !v.is_empty() && !(host && out.contains(&v)) {
                    out.push(v);
                }
            }
            out
        };
        Ok(match field {
            RowField::SourceIp => values(Direction::Source, false),
            RowField::DestinationIp => values(Direction::Destination, false),
            RowField::SourceHost => values(Direction::Source, true),
            RowField::DestinationHost => values(Direction::Destination, true),
            RowField::Service => catalog.services.clone(),
            _ => Vec::new(),
        })
    }

    // ── Validation ───────────────────────────────────────────────────

    /// Structural pre-check: required fields, then catalog membership of the
    /// category. Stops at the first offending row.
    pub fn validate_locally(&mut self, catalog: &OptionCatalog) -> Result<(), LocalIssue> {
        for (i, state) in self.rows.iter_mut().enumerate() {
            let checked = check_required(i + 1, &state.row)
                .and_then(|()| check_category(i + 1, &state.row, catalog));
            if let Err(issue) = checked {
                state.stage = RowStage::LocallyInvalid;
                return Err(issue);
            }
            state.stage = RowStage::LocallyValid;
        }
        Ok(())
    }

    /// Replace every row's errors with the backend verdict.
    pub fn apply_remote_verdict(&mut self, verdict: &ValidationResponse) -> ValidationErrorSet {
        let set = ValidationErrorSet::from_response(verdict, self.rows.len());
        for (i, state) in self.rows.iter_mut().enumerate() {
            state.errors = set.row(i).cloned().unwrap_or_default();
            state.stage = if state.errors.is_empty() && verdict.valid {
                RowStage::RemotelyValid
            } else if state.errors.is_empty() {
                state.stage
            } else {
                RowStage::RemotelyInvalid
            };
        }
        set
    }

    /// Errors currently attached to rows.
    pub fn errors(&self) -> ValidationErrorSet {
        let mut set = ValidationErrorSet::new();
        for (i, state) in self.rows.iter().enumerate() {
            set.set_row(i, state.errors.clone());
        }
        set
    }

    pub(crate) fn mark_submitted(&mut self, index: usize) {
        if let Some(state) = self.rows.get_mut(index) {
            state.stage = RowStage::Submitted;
        }
    }
}

/// Required-field check for one row, numbered `row_number` in messages.
pub fn check_required(row_number: usize, row: &AclRequestRow) -> Result<(), LocalIssue> {
    let issue = |field, message: String| LocalIssue {
        row: row_number,
        field,
        message,
    };

    if row.system_type.is_empty() {
        return Err(issue(
            RowField::SystemType,
            format!("Please select System Type in Request #{row_number}"),
        ));
    }

    let required: &[(RowField, &str)] = &[
        (RowField::Category, &row.category),
        (RowField::SourceIp, &row.source_ip),
        (RowField::DestinationIp, &row.destination_ip),
        (RowField::Service, &row.service),
    ];
    let required = if row.is_others() {
        &required[1..]
    } else {
        required
    };
    if let Some((field, _)) = required.iter().find(|(_, v)| v.is_empty()) {
        let message = if row.is_others() {
            format!(
                "Please fill Source IP, Destination IP, and Service for \"Others\" system type in Request #{row_number}"
            )
        } else {
            format!("Please fill all required fields in Request #{row_number}")
        };
        return Err(issue(*field, message));
    }

    if row.action.is_none() {
        return Err(issue(
            RowField::Action,
            format!("Please select Action in Request #{row_number}"),
        ));
    }
    Ok(())
}

/// The category must be one the catalog offers for the row's system type.
/// Free-text rows (Others, template) and system types the catalog has no
/// categories for always pass.
pub fn check_category(
    row_number: usize,
    row: &AclRequestRow,
    catalog: &OptionCatalog,
) -> Result<(), LocalIssue> {
    if row.has_free_category()
        || row.category.is_empty()
        || catalog.categories_for(&row.system_type).is_empty()
        || catalog.has_category(&row.system_type, &row.category)
    {
        return Ok(());
    }
    Err(LocalIssue {
        row: row_number,
        field: RowField::Category,
        message: format!(
            "Category '{}' is not offered for {} in Request #{row_number}",
            row.category, row.system_type
        ),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::catalog::tests::sample;
    use crate::model::{Action, OTHERS, TEMPLATE};
    use aclflow_api::{RowValidationResult, TemplateRule};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn prod_web(form: &mut RequestForm, catalog: &OptionCatalog, index: usize) {
        form.update_field(catalog, index, RowField::SystemType, "Prod")
            .unwrap();
        form.update_field(catalog, index, RowField::Category, "Web")
            .unwrap();
    }

    fn complete_row() -> AclRequestRow {
        AclRequestRow {
            system_type: "Prod".into(),
            category: "Web".into(),
            source_ip: "10.0.0.1".into(),
            destination_ip: "10.0.0.2".into(),
            service: "https".into(),
            action: Some(Action::Allow),
            ..AclRequestRow::default()
        }
    }

    // ── Row list ──

    #[test]
    fn add_then_remove_restores_rows() {
        let catalog = sample();
        let mut form = RequestForm::new();
        prod_web(&mut form, &catalog, 0);
        let before: Vec<AclRequestRow> = form.rows().iter().map(|r| r.row.clone()).collect();

        let idx = form.add_row();
        assert_eq!(form.len(), 2);
        assert!(form.remove_row(idx));

        let after: Vec<AclRequestRow> = form.rows().iter().map(|r| r.row.clone()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn removing_last_row_is_noop() {
        let mut form = RequestForm::new();
        assert!(!form.remove_row(0));
        assert_eq!(form.len(), 1);
        assert!(!form.remove_row(5));
    }

    #[test]
    fn from_rows_keeps_order_and_skips_side_effects() {
        let mut second = complete_row();
        second.service = "ssh".into();
        let form = RequestForm::from_rows(vec![complete_row(), second]);
        assert_eq!(form.len(), 2);
        assert_eq!(form.rows()[1].row.service, "ssh");
        assert!(!form.rows()[0].auto.any());
        assert_eq!(form.rows()[0].stage, RowStage::PartiallyFilled);

        assert_eq!(RequestForm::from_rows(Vec::new()).len(), 1);
    }

    #[test]
    fn out_of_range_edit_is_an_error() {
        let mut form = RequestForm::new();
        let err = form
            .update_field(&sample(), 3, RowField::Service, "ssh")
            .unwrap_err();
        assert!(matches!(err, CoreError::RowOutOfRange { index: 3, len: 1 }));
    }

    // ── Auto-population ──

    #[test]
    fn selecting_source_pairs_destination() {
        let catalog = sample();
        let mut form = RequestForm::new();
        prod_web(&mut form, &catalog, 0);

        let lookup = form
            .update_field(&catalog, 0, RowField::SourceIp, "10.0.0.1")
            .unwrap();
        assert!(lookup.is_none());

        let state = form.row(0).unwrap();
        assert_eq!(state.row.destination_ip, "10.0.0.2");
        assert_eq!(state.row.destination_host, "db1");
        assert_eq!(state.row.source_host, "web1");
        assert_eq!(state.row.service, "https");
        assert_eq!(state.row.source_option_id, Some(RecordId::from(7)));
        assert!(state.auto.destination_ip);
        assert!(state.auto.destination_host);
        assert!(!state.auto.source_ip);

        form.update_field(&catalog, 0, RowField::DestinationIp, "10.9.9.9")
            .unwrap();
        let state = form.row(0).unwrap();
        assert!(!state.auto.destination_ip);
        assert_eq!(state.row.destination_host, "");
        assert!(state.row.destination_option_id.is_none());
    }

    #[test]
    fn selecting_by_id_pairs_without_filter() {
        let catalog = sample();
        let mut form = RequestForm::new();

        form.update_field(&catalog, 0, RowField::DestinationOptionId, "7")
            .unwrap();
        let state = form.row(0).unwrap();
        assert_eq!(state.row.destination_ip, "10.0.0.2");
        assert_eq!(state.row.source_ip, "10.0.0.1");
        assert!(state.auto.source_ip);
        assert!(!state.auto.destination_ip);
    }

    #[test]
    fn unpaired_selection_leaves_other_side() {
        let catalog = sample();
        let mut form = RequestForm::new();
        prod_web(&mut form, &catalog, 0);
        form.update_field(&catalog, 0, RowField::DestinationIp, "10.8.8.8")
            .unwrap();

        form.update_field(&catalog, 0, RowField::SourceIp, "10.0.0.5")
            .unwrap();
        let state = form.row(0).unwrap();
        assert_eq!(state.row.source_host, "web5");
        assert_eq!(state.row.destination_ip, "10.8.8.8");
        assert!(!state.auto.destination_ip);
        assert!(state.auto.service);
    }

    #[test]
    fn unmatched_ip_requests_lookup() {
        let catalog = sample();
        let mut form = RequestForm::new();
        prod_web(&mut form, &catalog, 0);

        let lookup = form
            .update_field(&catalog, 0, RowField::SourceIp, "10.5.5.5")
            .unwrap()
            .unwrap();
        assert_eq!(lookup.query.source_ip, "10.5.5.5");
        assert_eq!(lookup.query.destination_ip, "");
        assert_eq!(lookup.query.system_type, "Prod");
        assert_eq!(lookup.ticket.direction, Direction::Source);
    }

    #[test]
    fn no_lookup_without_context_or_under_others() {
        let catalog = sample();
        let mut form = RequestForm::new();
        assert!(
            form.update_field(&catalog, 0, RowField::SourceIp, "10.5.5.5")
                .unwrap()
                .is_none()
        );

        form.update_field(&catalog, 0, RowField::SystemType, OTHERS)
            .unwrap();
        form.update_field(&catalog, 0, RowField::Category, "anything")
            .unwrap();
        assert!(
            form.update_field(&catalog, 0, RowField::SourceIp, "10.0.0.1")
                .unwrap()
                .is_none()
        );
        assert!(!form.row(0).unwrap().auto.any());
    }

    #[test]
    fn lookup_merge_skips_empty_values() {
        let catalog = sample();
        let mut form = RequestForm::new();
        prod_web(&mut form, &catalog, 0);
        form.update_field(&catalog, 0, RowField::Service, "ssh")
            .unwrap();
        let lookup = form
            .update_field(&catalog, 0, RowField::SourceIp, "10.5.5.5")
            .unwrap()
            .unwrap();

        let found = AutoPopulateMatch {
            source_host: Some("app5".into()),
            destination_ip: Some("10.6.6.6".into()),
            service: Some(String::new()),
            ..AutoPopulateMatch::default()
        };
        assert!(form.apply_lookup(lookup.ticket, &found));

        let state = form.row(0).unwrap();
        assert_eq!(state.row.source_host, "app5");
        assert_eq!(state.row.destination_ip, "10.6.6.6");
        assert_eq!(state.row.service, "ssh");
        assert!(state.auto.destination_ip);
        assert!(!state.auto.service);
    }

    #[test]
    fn stale_lookup_is_discarded() {
        let catalog = sample();
        let mut form = RequestForm::new();
        prod_web(&mut form, &catalog, 0);
        let first = form
            .update_field(&catalog, 0, RowField::SourceIp, "10.5.5.5")
            .unwrap()
            .unwrap();
        form.update_field(&catalog, 0, RowField::SourceIp, "10.5.5.6")
            .unwrap();

        let found = AutoPopulateMatch {
            source_host: Some("old".into()),
            ..AutoPopulateMatch::default()
        };
        assert!(!form.apply_lookup(first.ticket, &found));
        assert_eq!(form.row(0).unwrap().row.source_host, "");
    }

    #[test]
    fn lookup_keeps_fields_typed_after_it_was_issued() {
        let catalog = sample();
        let mut form = RequestForm::new();
        prod_web(&mut form, &catalog, 0);
        let lookup = form
            .update_field(&catalog, 0, RowField::SourceIp, "10.5.5.5")
            .unwrap()
            .unwrap();
        form.update_field(&catalog, 0, RowField::Service, "ssh")
            .unwrap();
        form.update_field(&catalog, 0, RowField::Description, "typed by me")
            .unwrap();

        let found = AutoPopulateMatch {
            source_host: Some("app5".into()),
            service: Some("https".into()),
            description: Some("from backend".into()),
            ..AutoPopulateMatch::default()
        };
        assert!(form.apply_lookup(lookup.ticket, &found));

        let state = form.row(0).unwrap();
        assert_eq!(state.row.service, "ssh");
        assert_eq!(state.row.description, "typed by me");
        assert!(!state.auto.service);
        assert!(!state.auto.description);
        assert_eq!(state.row.source_host, "app5");
        assert!(state.auto.source_host);
    }

    #[test]
    fn new_lookup_forgets_earlier_edits() {
        let catalog = sample();
        let mut form = RequestForm::new();
        prod_web(&mut form, &catalog, 0);
        form.update_field(&catalog, 0, RowField::Service, "ssh")
            .unwrap();
        let lookup = form
            .update_field(&catalog, 0, RowField::DestinationIp, "10.8.8.8")
            .unwrap()
            .unwrap();

        let found = AutoPopulateMatch {
            service: Some("https".into()),
            ..AutoPopulateMatch::default()
        };
        assert!(form.apply_lookup(lookup.ticket, &found));
        let state = form.row(0).unwrap();
        assert_eq!(state.row.service, "https");
        assert!(state.auto.service);
    }

    #[test]
    fn lookup_for_removed_row_is_discarded() {
        let catalog = sample();
        let mut form = RequestForm::new();
        let idx = form.add_row();
        prod_web(&mut form, &catalog, idx);
        let lookup = form
            .update_field(&catalog, idx, RowField::DestinationIp, "10.7.7.7")
            .unwrap()
            .unwrap();
        form.remove_row(idx);

        assert!(!form.apply_lookup(lookup.ticket, &AutoPopulateMatch::default()));
    }

    // ── Errors ──

    #[test]
    fn editing_field_clears_its_error() {
        let catalog = sample();
        let mut form = RequestForm::new();
        form.update_field(&catalog, 0, RowField::Service, "bogus")
            .unwrap();
        form.touch_field(0, RowField::Service).unwrap();
        assert!(form.row(0).unwrap().errors.contains_key("service"));

        form.update_field(&catalog, 0, RowField::Service, "ssh")
            .unwrap();
        assert!(form.row(0).unwrap().errors.is_empty());
    }

    #[test]
    fn system_type_change_clears_row_errors() {
        let catalog = sample();
        let mut form = RequestForm::new();
        form.update_field(&catalog, 0, RowField::SourceIp, "nope")
            .unwrap();
        form.touch_field(0, RowField::SourceIp).unwrap();
        assert_eq!(form.errors().error_count(), 1);

        form.update_field(&catalog, 0, RowField::SystemType, "Dev")
            .unwrap();
        assert!(form.errors().is_empty());
    }

    #[test]
    fn category_change_keeps_errors_on_template_rows() {
        let catalog = sample();
        let mut form = RequestForm::new();
        form.rows[0].row = AclRequestRow {
            system_type: TEMPLATE.into(),
            category: "custom-cat".into(),
            source_ip: "nope".into(),
            ..AclRequestRow::default()
        };
        form.touch_field(0, RowField::SourceIp).unwrap();
        assert!(form.row(0).unwrap().errors.contains_key("sourceIP"));

        form.update_field(&catalog, 0, RowField::Category, "other-cat")
            .unwrap();
        assert!(form.row(0).unwrap().errors.contains_key("sourceIP"));
        assert!(!form.row(0).unwrap().errors.contains_key("category"));
    }

    #[test]
    fn unknown_category_is_flagged_and_blocks_local_check() {
        let catalog = sample();
        let mut form = RequestForm::new();
        form.update_field(&catalog, 0, RowField::SystemType, "Prod")
            .unwrap();
        form.update_field(&catalog, 0, RowField::Category, "Bogus")
            .unwrap();
        assert_eq!(
            form.row(0).unwrap().errors["category"],
            "Category 'Bogus' is not offered for Prod in Request #1"
        );

        form.rows[0].row = AclRequestRow {
            category: "Bogus".into(),
            ..complete_row()
        };
        let issue = form.validate_locally(&catalog).unwrap_err();
        assert_eq!(issue.field, RowField::Category);
        assert_eq!(form.rows()[0].stage, RowStage::LocallyInvalid);

        form.update_field(&catalog, 0, RowField::Category, "Web")
            .unwrap();
        assert!(form.row(0).unwrap().errors.is_empty());
        assert!(form.validate_locally(&catalog).is_ok());
    }

    #[test]
    fn free_text_categories_skip_catalog_check() {
        let catalog = sample();
        let others = AclRequestRow {
            system_type: OTHERS.into(),
            category: "Lab".into(),
            ..complete_row()
        };
        assert!(check_category(1, &others, &catalog).is_ok());

        let uncatalogued = AclRequestRow {
            system_type: "Staging".into(),
            category: "Lab".into(),
            ..complete_row()
        };
        assert!(check_category(1, &uncatalogued, &catalog).is_ok());

        let bogus = AclRequestRow {
            category: "Bogus".into(),
            ..complete_row()
        };
        assert!(check_category(1, &bogus, &OptionCatalog::default()).is_ok());
        assert!(check_category(1, &bogus, &catalog).is_err());
    }

    #[test]
    fn touch_under_others_only_marks() {
        let catalog = sample();
        let mut form = RequestForm::new();
        form.update_field(&catalog, 0, RowField::SystemType, OTHERS)
            .unwrap();
        form.update_field(&catalog, 0, RowField::SourceIp, "nope")
            .unwrap();
        form.touch_field(0, RowField::SourceIp).unwrap();

        let state = form.row(0).unwrap();
        assert!(state.touched.contains(&RowField::SourceIp));
        assert!(state.errors.is_empty());
    }

    #[test]
    fn touch_skips_blank_description() {
        let mut form = RequestForm::new();
        form.touch_field(0, RowField::Description).unwrap();
        assert!(form.row(0).unwrap().errors.is_empty());
    }

    // ── Templates ──

    #[test]
    fn load_template_replaces_rows() {
        let catalog = sample();
        let mut form = RequestForm::new();
        form.add_row();
        form.update_field(&catalog, 0, RowField::Service, "ssh")
            .unwrap();

        let template = Template {
            name: "web-stack".into(),
            created_by: None,
            created_at: None,
            rules: vec![TemplateRule {
                template_name: "web-stack".into(),
                system_type: "Prod".into(),
                category: "custom-cat".into(),
                source_ip: "10.0.0.1".into(),
                destination_ip: "10.0.0.2".into(),
                service: "https".into(),
                action: Some("Allow".into()),
                ..TemplateRule::default()
            }],
        };
        assert!(form.load_template(&template));
        assert_eq!(form.len(), 1);

        let row = &form.row(0).unwrap().row;
        assert_eq!(row.system_type, TEMPLATE);
        assert_eq!(row.category, "custom-cat");
        assert_eq!(row.action, Some(Action::Allow));
        let origin = row.template_origin.as_ref().unwrap();
        assert_eq!(origin.template_name, "web-stack");
        assert_eq!(origin.original_system_type, "Prod");
    }

    #[test]
    fn empty_template_is_ignored() {
        let mut form = RequestForm::new();
        form.add_row();
        let template = Template {
            name: "empty".into(),
            created_by: None,
            created_at: None,
            rules: Vec::new(),
        };
        assert!(!form.load_template(&template));
        assert_eq!(form.len(), 2);
    }

    // ── Views ──

    #[test]
    fn suggestions_follow_row_context() {
        let catalog = sample();
        let mut form = RequestForm::new();
        prod_web(&mut form, &catalog, 0);
        assert_eq!(
            form.suggestions(&catalog, 0, RowField::SourceIp).unwrap(),
            vec!["10.0.0.1".to_string(), "10.0.0.5".to_string()]
        );
        assert_eq!(
            form.suggestions(&catalog, 0, RowField::DestinationHost)
                .unwrap(),
            vec!["db1".to_string()]
        );
        assert_eq!(
            form.filtered_categories(&catalog, 0).unwrap()[0].value,
            "Web"
        );
        assert_eq!(
            form.filtered_source_endpoints(&catalog, 0).unwrap().len(),
            2
        );
        assert_eq!(
            form.filtered_destination_endpoints(&catalog, 0)
                .unwrap()
                .len(),
            1
        );
    }

    // ── Local validation ──

    #[test]
    fn local_validation_messages() {
        let mut form = RequestForm::new();
        let issue = form.validate_locally(&sample()).unwrap_err();
        assert_eq!(issue.message, "Please select System Type in Request #1");

        form.rows[0].row = complete_row();
        let idx = form.push_row(AclRequestRow {
            system_type: "Prod".into(),
            source_ip: "10.0.0.1".into(),
            ..AclRequestRow::default()
        });
        let issue = form.validate_locally(&sample()).unwrap_err();
        assert_eq!(issue.row, 2);
        assert_eq!(issue.field, RowField::Category);
        assert_eq!(issue.message, "Please fill all required fields in Request #2");
        assert_eq!(form.rows()[0].stage, RowStage::LocallyValid);
        assert_eq!(form.rows()[idx].stage, RowStage::LocallyInvalid);

        form.rows[1].row = AclRequestRow {
            system_type: OTHERS.into(),
            source_ip: "10.0.0.1".into(),
            destination_ip: "10.0.0.2".into(),
            ..AclRequestRow::default()
        };
        let issue = form.validate_locally(&sample()).unwrap_err();
        assert_eq!(issue.field, RowField::Service);
        assert_eq!(
            issue.message,
            "Please fill Source IP, Destination IP, and Service for \"Others\" system type in Request #2"
        );

        form.rows[1].row.service = "ssh".into();
        let issue = form.validate_locally(&sample()).unwrap_err();
        assert_eq!(issue.message, "Please select Action in Request #2");

        form.rows[1].row.action = Some(Action::Deny);
        assert!(form.validate_locally(&sample()).is_ok());
    }

    #[test]
    fn remote_verdict_replaces_errors() {
        let mut form = RequestForm::new();
        form.rows[0].row = complete_row();
        form.push_row(complete_row());
        form.rows[0]
            .errors
            .insert("sourceIP".into(), "local".into());

        let verdict = ValidationResponse {
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
            ],
            error_count: 1,
        };
        let set = form.apply_remote_verdict(&verdict);

        assert_eq!(set.len(), 1);
        assert!(form.rows()[0].errors.is_empty());
        assert_eq!(form.rows()[1].stage, RowStage::RemotelyInvalid);
        assert_eq!(form.errors(), set);
    }
}
