// aclflow-api: Async Rust client for the ACL request workflow backend

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod options;
pub mod reports;
pub mod requests;
pub mod session;
pub mod templates;
pub mod transport;

pub use client::AclClient;
pub use error::Error;
pub use models::{
    AclRequestPayload, AclRequestRecord, AutoPopulateMatch, AutoPopulateQuery, CategoryOption,
    CreatedRequest, EndpointOption, OptionsResponse, RecordId, RequestComment, RowValidationResult,
    SignupRequest, SubmittedRecord, TemplateFilter, TemplateGroup, TemplateRule, UsedTemplate,
    UserInfo, ValidationResponse,
};
pub use options::OTHERS_SYSTEM_TYPE;
pub use reports::Report;
pub use session::{MemorySession, SessionStore};
pub use transport::{TlsMode, TransportConfig};
