// ── Domain model ──
//
// Rows, the option catalog, templates, validation errors, and workflow
// stages. Wire types stay in `aclflow_api`; these are what the form
// controller and the CLI work with.

pub mod catalog;
pub mod errors;
pub mod row;
pub mod template;
pub mod workflow;

pub use catalog::{OptionCatalog, PairedEndpoint};
pub use errors::{FieldErrors, ValidationErrorSet};
pub use row::{AclRequestRow, Action, Direction, OTHERS, RowField, TEMPLATE, TemplateOrigin};
pub use template::Template;
pub use workflow::{RequestFilter, UnknownStage, WorkflowStage, WorkflowSummary};
