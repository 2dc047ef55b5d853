// ── Form session ──
//
// Owns one request form for its whole life: the option catalog (swapped
// wholesale on a forced sync), the rows, and the background auto-populate
// lookups. Cheaply cloneable; all clones share the same form.

use std::sync::Arc;

use arc_swap::ArcSwap;
use futures_util::future::join_all;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use aclflow_api::{AclClient, Report, SubmittedRecord};

use crate::error::{CoreError, FailedRow, SubmittedRow};
use crate::form::{LookupRequest, RequestForm, RowStage};
use crate::model::{AclRequestRow, OptionCatalog, RowField, Template, ValidationErrorSet};

/// Status every freshly created request starts in.
const INITIAL_STATUS: &str = "Pending";

/// Knobs for [`FormSession::submit_all`].
#[derive(Debug, Clone)]
pub struct SubmitOptions {
    /// Name recorded on the submission report. Defaults to the logged-in
    /// user.
    pub requester: Option<String>,
    /// Fetch the submission spreadsheet after a successful submit.
    pub download_report: bool,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self {
            requester: None,
            download_report: true,
        }
    }
}

/// Result of a fully successful submission.
#[derive(Debug, Clone)]
pub struct Submission {
    pub records: Vec<SubmittedRecord>,
    /// `None` when not requested or when the download failed.
    pub report: Option<Report>,
}

/// A live request form bound to a backend client.
#[derive(Clone)]
pub struct FormSession {
    inner: Arc<FormInner>,
}

struct FormInner {
    client: Arc<AclClient>,
    catalog: ArcSwap<OptionCatalog>,
    form: Mutex<RequestForm>,
    cancel: CancellationToken,
    lookups: Mutex<Vec<JoinHandle<()>>>,
}

impl FormSession {
    /// A session over an already loaded catalog.
    pub fn new(client: Arc<AclClient>, catalog: OptionCatalog) -> Self {
        Self {
            inner: Arc::new(FormInner {
                client,
                catalog: ArcSwap::from_pointee(catalog),
                form: Mutex::new(RequestForm::new()),
                cancel: CancellationToken::new(),
                lookups: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Fetch the catalog (optionally forcing a backend sync) and start a
    /// session with one blank row.
    pub async fn open(client: Arc<AclClient>, sync: bool) -> Result<Self, CoreError> {
        let catalog = OptionCatalog::from(client.fetch_options(sync).await?);
        info!(
            system_types = catalog.system_types.len(),
            sources = catalog.source_endpoints.len(),
            destinations = catalog.destination_endpoints.len(),
            "option catalog loaded"
        );
        Ok(Self::new(client, catalog))
    }

    pub fn client(&self) -> &Arc<AclClient> {
        &self.inner.client
    }

    /// The catalog as of now. Never mutated; a refresh swaps in a new one.
    pub fn catalog(&self) -> Arc<OptionCatalog> {
        self.inner.catalog.load_full()
    }

    /// Reload the catalog. `sync` asks the backend to resync its sources
    /// first.
    pub async fn refresh_catalog(&self, sync: bool) -> Result<Arc<OptionCatalog>, CoreError> {
        let fresh = Arc::new(OptionCatalog::from(
            self.inner.client.fetch_options(sync).await?,
        ));
        self.inner.catalog.store(Arc::clone(&fresh));
        debug!(sync, last_sync = ?fresh.last_sync, "catalog replaced");
        Ok(fresh)
    }

    /// A copy of the current form.
    pub async fn snapshot(&self) -> RequestForm {
        self.inner.form.lock().await.clone()
    }

    // ── Row edits ────────────────────────────────────────────────────

    pub async fn add_row(&self) -> usize {
        self.inner.form.lock().await.add_row()
    }

    pub async fn remove_row(&self, index: usize) -> bool {
        self.inner.form.lock().await.remove_row(index)
    }

    /// Set a field. A typed IP with no catalog match starts a background
    /// lookup whose answer is merged when it arrives.
    pub async fn update_field(
        &self,
        index: usize,
        field: RowField,
        value: &str,
    ) -> Result<(), CoreError> {
        let catalog = self.catalog();
        let lookup = self
            .inner
            .form
            .lock()
            .await
            .update_field(&catalog, index, field, value)?;
        if let Some(lookup) = lookup {
            self.spawn_lookup(lookup).await;
        }
        Ok(())
    }

    pub async fn touch_field(&self, index: usize, field: RowField) -> Result<(), CoreError> {
        self.inner.form.lock().await.touch_field(index, field)
    }

    /// Fill row `index` from a prepared row, field by field, so pairing and
    /// lookups behave as if typed. Explicit values win over lookups.
    pub async fn fill_row(&self, index: usize, row: &AclRequestRow) -> Result<(), CoreError> {
        let leading = [
            RowField::SystemType,
            RowField::Category,
            RowField::SourceOptionId,
            RowField::DestinationOptionId,
            RowField::SourceIp,
            RowField::DestinationIp,
        ];
        let trailing = [
            RowField::SourceHost,
            RowField::DestinationHost,
            RowField::Service,
            RowField::Description,
            RowField::Action,
        ];

        for field in leading {
            let value = row.get(field);
            if !value.is_empty() {
                self.update_field(index, field, &value).await?;
            }
        }
        self.settle().await;
        for field in trailing {
            let value = row.get(field);
            if !value.is_empty() {
                self.update_field(index, field, &value).await?;
            }
        }
        Ok(())
    }

    /// Replace the form with `rows`, each filled through [`fill_row`](Self::fill_row).
    pub async fn fill_rows(&self, rows: &[AclRequestRow]) -> Result<(), CoreError> {
        self.inner.form.lock().await.reset();
        self.append_rows(rows).await
    }

    /// Append `rows` after the existing ones. A lone untouched row is reused.
    pub async fn append_rows(&self, rows: &[AclRequestRow]) -> Result<(), CoreError> {
        for row in rows {
            let index = {
                let mut form = self.inner.form.lock().await;
                let blank = form.len() == 1
                    && form.rows().first().is_some_and(|r| r.stage == RowStage::Empty);
                if blank { 0 } else { form.add_row() }
            };
            self.fill_row(index, row).await?;
        }
        self.settle().await;
        Ok(())
    }

    /// Replace the rows with a template's rules. `false` when it has none.
    pub async fn load_template(&self, template: &Template) -> bool {
        self.inner.form.lock().await.load_template(template)
    }

    /// Find a template by name among the grouped templates and load it.
    pub async fn load_template_named(&self, name: &str) -> Result<Template, CoreError> {
        let groups = self.inner.client.list_template_groups().await?;
        let template = groups
            .into_iter()
            .map(Template::from)
            .find(|t| t.name == name)
            .ok_or_else(|| CoreError::NotFound {
                identifier: format!("template {name:?}"),
            })?;
        if !self.load_template(&template).await {
            warn!(template = name, "template has no rules; form left unchanged");
        }
        Ok(template)
    }

    // ── Lookups ──────────────────────────────────────────────────────

    async fn spawn_lookup(&self, lookup: LookupRequest) {
        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            let result = tokio::select! {
                () = inner.cancel.cancelled() => return,
                r = inner.client.auto_populate(&lookup.query) => r,
            };
            match result {
                Ok(Some(found)) => {
                    let applied = inner.form.lock().await.apply_lookup(lookup.ticket, &found);
                    debug!(row_id = lookup.ticket.row_id, applied, "auto-populate answered");
                }
                Ok(None) => debug!(row_id = lookup.ticket.row_id, "auto-populate found nothing"),
                Err(e) => warn!(error = %e, "auto-populate failed"),
            }
        });
        self.inner.lookups.lock().await.push(handle);
    }

    /// Wait for every outstanding lookup.
    pub async fn settle(&self) {
        let handles = std::mem::take(&mut *self.inner.lookups.lock().await);
        for result in join_all(handles).await {
            if let Err(e) = result {
                if !e.is_cancelled() {
                    warn!(error = %e, "lookup task failed");
                }
            }
        }
    }

    /// Cancel outstanding lookups. The form stays readable.
    pub async fn close(&self) {
        self.inner.cancel.cancel();
        for handle in self.inner.lookups.lock().await.drain(..) {
            handle.abort();
        }
        debug!("form session closed");
    }

    // ── Validation and submission ────────────────────────────────────

    pub async fn validate_locally(&self) -> Result<(), CoreError> {
        let catalog = self.catalog();
        self.inner.form.lock().await.validate_locally(&catalog)?;
        Ok(())
    }

    /// Run the backend's validation over every row and attach its errors.
    /// An invalid verdict is a `RemoteValidation` error.
    pub async fn validate_remotely(&self) -> Result<(), CoreError> {
        self.settle().await;
        let mut form = self.inner.form.lock().await;
        self.check_remote(&mut form).await
    }

    async fn check_remote(&self, form: &mut RequestForm) -> Result<(), CoreError> {
        let payloads: Vec<_> = form.rows().iter().map(|s| s.row.to_payload(false)).collect();
        let verdict = self.inner.client.validate_requests(&payloads).await?;
        let errors = form.apply_remote_verdict(&verdict);
        if verdict.valid {
            return Ok(());
        }
        info!(
            rows = errors.len(),
            fields = errors.error_count(),
            "backend rejected the form"
        );
        Err(CoreError::RemoteValidation {
            invalid_rows: errors,
        })
    }

    /// Errors currently attached to the rows.
    pub async fn errors(&self) -> ValidationErrorSet {
        self.inner.form.lock().await.errors()
    }

    /// Validate locally, then remotely, then create every row. Nothing is
    /// created unless the whole form passes both checks. On full success
    /// the form resets to one blank row.
    pub async fn submit_all(&self, options: &SubmitOptions) -> Result<Submission, CoreError> {
        self.settle().await;
        let mut form = self.inner.form.lock().await;

        form.validate_locally(&self.catalog())?;
        self.check_remote(&mut form).await?;

        let rows: Vec<AclRequestRow> = form.rows().iter().map(|s| s.row.clone()).collect();
        let client = &self.inner.client;
        let outcomes = join_all(rows.iter().map(|row| {
            let payload = row.to_payload(true);
            async move { client.create_request(&payload).await }
        }))
        .await;

        let mut succeeded = Vec::new();
        let mut failed = Vec::new();
        let mut first_error = None;
        for (i, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Ok(created) => succeeded.push(SubmittedRow {
                    row: i + 1,
                    request_id: created.request_id.map(|id| id.to_string()),
                }),
                Err(e) => {
                    warn!(row = i + 1, error = %e, "create failed");
                    failed.push(FailedRow {
                        row: i + 1,
                        message: e.to_string(),
                    });
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        if let Some(err) = first_error {
            if succeeded.is_empty() && err.is_auth_expired() {
                return Err(err.into());
            }
            for s in &succeeded {
                form.mark_submitted(s.row - 1);
            }
            return Err(CoreError::PartialSubmission { succeeded, failed });
        }

        let requester = options
            .requester
            .clone()
            .or_else(|| client.session().user().map(|u| u.username))
            .unwrap_or_else(|| "User".to_owned());
        let records: Vec<SubmittedRecord> = rows
            .iter()
            .zip(&succeeded)
            .map(|(row, s)| submitted_record(row, s, &requester))
            .collect();

        form.reset();
        drop(form);
        info!(count = records.len(), "requests submitted");

        let report = if options.download_report {
            match client.download_submission_report(&records).await {
                Ok(report) => Some(report),
                Err(e) => {
                    warn!(error = %e, "submission report download failed");
                    None
                }
            }
        } else {
            None
        };

        Ok(Submission { records, report })
    }
}

fn submitted_record(row: &AclRequestRow, created: &SubmittedRow, requester: &str) -> SubmittedRecord {
    SubmittedRecord {
        id: created
            .request_id
            .clone()
            .unwrap_or_else(|| "N/A".to_owned()),
        requester: requester.to_owned(),
        system_type: row.system_type.clone(),
        category: row.category.clone(),
        source_ip: row.source_ip.clone(),
        source_host: row.source_host.clone(),
        destination_ip: row.destination_ip.clone(),
        destination_host: row.destination_host.clone(),
        service: row.service.clone(),
        description: row.description.clone(),
        action: row.action.map(|a| a.to_string()).unwrap_or_default(),
        status: INITIAL_STATUS.to_owned(),
    }
}
