// aclflow-core: Validators, multi-row request form, and review workflow on top of aclflow-api.

pub mod config;
pub mod error;
pub mod form;
pub mod model;
pub mod review;
pub mod session;
pub mod validate;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{BackendConfig, Credentials, TlsVerification};
pub use error::{CoreError, FailedRow, SubmittedRow};
pub use form::{
    AutoFlags, LocalIssue, LookupRequest, LookupTicket, RequestForm, RowId, RowStage, RowState,
    check_category, check_required,
};
pub use review::ReviewDesk;
pub use session::{FormSession, Submission, SubmitOptions};
pub use validate::{
    RequestVerdict, Verdict, validate_acl_request, validate_description, validate_field,
    validate_ip, validate_service,
};

pub use model::{
    AclRequestRow, Action, Direction, FieldErrors, OTHERS, OptionCatalog, PairedEndpoint,
    RequestFilter, RowField, TEMPLATE, Template, TemplateOrigin, UnknownStage,
    ValidationErrorSet, WorkflowStage, WorkflowSummary,
};
