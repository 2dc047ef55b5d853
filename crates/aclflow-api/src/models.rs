// Wire types for the ACL request backend.
//
// Field names follow the backend exactly: snake_case for catalog, template,
// and stored-request records, and the mixed camelCase (`sourceIP`) the
// request-submission endpoints expect.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

// ── Identifiers ─────────────────────────────────────────────────────

/// Opaque backend record key.
///
/// The backend emits integer ids, older payloads carry them as strings;
/// both deserialize into the same textual key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        Self(n.to_string())
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Int(n) => Self(n.to_string()),
            Raw::Text(s) => Self(s),
        })
    }
}

/// Treat JSON `null` like an absent string.
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// ── Auth ────────────────────────────────────────────────────────────

/// The user record returned by login.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(default)]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl UserInfo {
    /// Case-insensitive role check.
    pub fn has_role(&self, role: &str) -> bool {
        self.role
            .as_deref()
            .is_some_and(|r| r.eq_ignore_ascii_case(role))
    }

    pub fn has_any_role(&self, roles: &[&str]) -> bool {
        roles.iter().any(|r| self.has_role(r))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    pub token: String,
    pub user: UserInfo,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RoleResponse {
    pub role: String,
}

/// Fields for account creation.
#[derive(Debug, Clone, Serialize)]
pub struct SignupRequest {
    pub username: String,
    pub fullname: String,
    pub email: String,
    pub password: String,
}

// ── Option catalog ──────────────────────────────────────────────────

/// `GET /api/mysql-options` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptionsResponse {
    #[serde(default)]
    pub system_types: Vec<String>,
    #[serde(default)]
    pub categories: Vec<CategoryOption>,
    #[serde(default)]
    pub source_ips: Vec<EndpointOption>,
    #[serde(default)]
    pub destination_ips: Vec<EndpointOption>,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub last_sync: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryOption {
    pub value: String,
    pub system_type: String,
    #[serde(default)]
    pub display: String,
}

/// One end of a known flow. Source and destination entries sharing an `id`
/// come from the same firewall rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointOption {
    pub id: RecordId,
    pub value: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub host: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub system_type: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub category: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub service: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
}

// ── Auto-populate ───────────────────────────────────────────────────

/// `POST /api/auto-populate` body. Exactly one of the IP fields is non-empty.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AutoPopulateQuery {
    pub system_type: String,
    pub category: String,
    #[serde(rename = "sourceIP")]
    pub source_ip: String,
    #[serde(rename = "destinationIP")]
    pub destination_ip: String,
}

/// Best-effort match. Every field is optional; absent ones are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AutoPopulateMatch {
    #[serde(default)]
    pub source_ip: Option<String>,
    #[serde(default)]
    pub source_host: Option<String>,
    #[serde(default)]
    pub destination_ip: Option<String>,
    #[serde(default)]
    pub destination_host: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl AutoPopulateMatch {
    /// `true` when the backend matched nothing usable.
    pub fn is_empty(&self) -> bool {
        [
            &self.source_ip,
            &self.source_host,
            &self.destination_ip,
            &self.destination_host,
            &self.service,
            &self.description,
        ]
        .iter()
        .all(|v| v.as_deref().is_none_or(str::is_empty))
    }
}

// ── Request submission ──────────────────────────────────────────────

/// One ACL request as the validation and creation endpoints expect it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclRequestPayload {
    pub system_type: String,
    pub category: String,
    #[serde(rename = "sourceIP")]
    pub source_ip: String,
    #[serde(rename = "sourceHost")]
    pub source_host: String,
    #[serde(rename = "destinationIP")]
    pub destination_ip: String,
    #[serde(rename = "destinationHost")]
    pub destination_host: String,
    pub service: String,
    pub description: String,
    pub action: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct RequestsEnvelope<'a, T> {
    pub requests: &'a [T],
}

/// `POST /api/v1/validate-requests` verdict.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ValidationResponse {
    pub valid: bool,
    #[serde(default)]
    pub validation_results: Vec<RowValidationResult>,
    #[serde(default)]
    pub error_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RowValidationResult {
    pub row_index: usize,
    pub valid: bool,
    #[serde(default)]
    pub errors: BTreeMap<String, String>,
}

/// `POST /create_acl_request` response.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedRequest {
    #[serde(default)]
    pub request_id: Option<RecordId>,
    #[serde(default)]
    pub message: Option<String>,
}

/// A just-submitted row as posted to the submission report endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmittedRecord {
    pub id: String,
    pub requester: String,
    pub system_type: String,
    pub category: String,
    #[serde(rename = "sourceIP")]
    pub source_ip: String,
    #[serde(rename = "sourceHost")]
    pub source_host: String,
    #[serde(rename = "destinationIP")]
    pub destination_ip: String,
    #[serde(rename = "destinationHost")]
    pub destination_host: String,
    pub service: String,
    pub description: String,
    pub action: String,
    pub status: String,
}

// ── Stored requests (review workflow) ───────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestComment {
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// A persisted ACL request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclRequestRecord {
    pub id: RecordId,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub requester: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub system_type: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub category: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub source_ip: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub source_host: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub destination_ip: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub destination_host: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub service: String,
    #[serde(default, alias = "description", deserialize_with = "null_as_empty")]
    pub reason: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub status: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub template_id: Option<RecordId>,
    #[serde(default)]
    pub comments: Vec<RequestComment>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AclRequestsResponse {
    #[serde(default)]
    pub acl_requests: Vec<AclRequestRecord>,
}

/// `GET /acl_requests/{id}` answers either wrapped or bare.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum AclRequestEnvelope {
    Wrapped { acl_request: AclRequestRecord },
    Bare(AclRequestRecord),
}

impl AclRequestEnvelope {
    pub fn into_record(self) -> AclRequestRecord {
        match self {
            Self::Wrapped { acl_request } => acl_request,
            Self::Bare(record) => record,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct StatusUpdate<'a> {
    pub status: &'a str,
    pub comments: &'a str,
    pub updated_by: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct CommentBody<'a> {
    pub comment: &'a str,
    pub author: &'a str,
    pub timestamp: String,
}

// ── Templates ───────────────────────────────────────────────────────

/// One rule of a (possibly multi-rule) template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateRule {
    #[serde(default)]
    pub id: Option<RecordId>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub template_name: String,
    #[serde(default)]
    pub requester: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub system_type: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub category: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub source_ip: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub source_host: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub destination_ip: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub destination_host: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub service: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Rules grouped under one template name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateGroup {
    pub template_name: String,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub rule_count: usize,
    #[serde(default)]
    pub rules: Vec<TemplateRule>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GroupedTemplatesResponse {
    #[serde(default)]
    pub templates: Vec<TemplateGroup>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TemplatesResponse {
    #[serde(default)]
    pub templates: Vec<TemplateRule>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TemplateResponse {
    pub template: TemplateRule,
}

/// Query filters for the flat template listing.
#[derive(Debug, Clone, Default)]
pub struct TemplateFilter {
    pub system_type: Option<String>,
    pub category: Option<String>,
    pub requester: Option<String>,
}

impl TemplateFilter {
    pub(crate) fn to_params(&self) -> Vec<(&'static str, String)> {
        [
            ("system_type", &self.system_type),
            ("category", &self.category),
            ("requester", &self.requester),
        ]
        .into_iter()
        .filter_map(|(k, v)| v.as_ref().filter(|s| !s.is_empty()).map(|s| (k, s.clone())))
        .collect()
    }

    /// Whether a rule passes every non-blank filter.
    pub fn matches(&self, rule: &TemplateRule) -> bool {
        let ok = |want: &Option<String>, have: &str| {
            want.as_deref()
                .filter(|w| !w.is_empty())
                .is_none_or(|w| w == have)
        };
        ok(&self.system_type, &rule.system_type)
            && ok(&self.category, &rule.category)
            && ok(&self.requester, rule.requester.as_deref().unwrap_or_default())
    }
}

/// Summary of a request created from a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsedTemplate {
    pub id: RecordId,
    #[serde(default)]
    pub template_id: Option<RecordId>,
    #[serde(default)]
    pub template_name: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UseTemplateResponse {
    pub request: UsedTemplate,
}

// ── Errors ──────────────────────────────────────────────────────────

/// Error body shape: `{"error": "..."}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn role_checks_ignore_case() {
        let user = UserInfo {
            role: Some("Admin".into()),
            ..UserInfo::default()
        };
        assert!(user.has_role("admin"));
        assert!(user.has_any_role(&["reviewer", "ADMIN"]));
        assert!(!UserInfo::default().has_any_role(&["admin"]));
    }

    #[test]
    fn record_id_accepts_int_and_string() {
        let a: RecordId = serde_json::from_value(json!(7)).unwrap();
        let b: RecordId = serde_json::from_value(json!("7")).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "7");
    }

    #[test]
    fn payload_uses_backend_field_names() {
        let payload = AclRequestPayload {
            source_ip: "10.0.0.1".into(),
            ..AclRequestPayload::default()
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["sourceIP"], "10.0.0.1");
        assert!(value.get("system_type").is_some());
        assert!(value.get("source_ip").is_none());
    }

    #[test]
    fn auto_populate_error_body_is_empty_match() {
        let m: AutoPopulateMatch =
            serde_json::from_value(json!({"error": "No matching rules Found"})).unwrap();
        assert!(m.is_empty());
    }

    #[test]
    fn template_filter_skips_blank_values() {
        let filter = TemplateFilter {
            system_type: Some("Prod".into()),
            category: Some(String::new()),
            requester: None,
        };
        assert_eq!(filter.to_params(), vec![("system_type", "Prod".to_string())]);
    }
}
