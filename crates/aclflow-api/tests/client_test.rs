// Integration tests for `AclClient` using wiremock.
#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use aclflow_api::{
    AclClient, AclRequestPayload, AutoPopulateQuery, Error, MemorySession, SessionStore,
    SubmittedRecord, TemplateFilter, UserInfo,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, AclClient, Arc<MemorySession>) {
    let server = MockServer::start().await;
    let session = Arc::new(MemorySession::with_token(
        SecretString::from("tok-123".to_string()),
        UserInfo {
            username: "alice".into(),
            role: Some("user".into()),
            ..UserInfo::default()
        },
    ));
    let client =
        AclClient::with_client(reqwest::Client::new(), &server.uri(), session.clone()).unwrap();
    (server, client, session)
}

fn payload(service: &str) -> AclRequestPayload {
    AclRequestPayload {
        system_type: "Prod".into(),
        category: "Web".into(),
        source_ip: "10.0.0.1".into(),
        source_host: "web01".into(),
        destination_ip: "10.0.0.2".into(),
        destination_host: "db01".into(),
        service: service.into(),
        description: "ACL Request".into(),
        action: "allow".into(),
    }
}

// ── Auth ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_login_stores_token() {
    let server = MockServer::start().await;
    let session = Arc::new(MemorySession::new());
    let client =
        AclClient::with_client(reqwest::Client::new(), &server.uri(), session.clone()).unwrap();

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .and(body_partial_json(json!({"email": "a@example.com", "password": "pw"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "jwt-abc",
            "user": {"id": 4, "username": "alice", "email": "a@example.com",
                     "name": "Alice", "role": "admin"}
        })))
        .mount(&server)
        .await;

    let user = client
        .login("a@example.com", &SecretString::from("pw".to_string()))
        .await
        .unwrap();

    assert_eq!(user.username, "alice");
    assert!(session.is_authenticated());
    assert!(session.has_role("admin"));
}

#[tokio::test]
async fn test_login_rejected() {
    let (server, client, _) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": "Passwords do not match"})),
        )
        .mount(&server)
        .await;

    let err = client
        .login("a@example.com", &SecretString::from("bad".to_string()))
        .await
        .unwrap_err();

    match err {
        Error::Authentication { message } => assert_eq!(message, "Passwords do not match"),
        other => panic!("expected Authentication, got {other:?}"),
    }
}

#[tokio::test]
async fn test_bearer_header_sent() {
    let (server, client, _) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/rbac/role"))
        .and(header("Authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"role": "user"})))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(client.role().await.unwrap(), "user");
}

#[tokio::test]
async fn test_unauthorized_clears_session() {
    let (server, client, session) = setup().await;

    Mock::given(method("GET"))
        .and(path("/acl_requests"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": "Token has expired"})),
        )
        .mount(&server)
        .await;

    let err = client.list_requests().await.unwrap_err();

    assert!(matches!(err, Error::SessionExpired));
    assert!(err.is_auth_expired());
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn test_forbidden_maps_message() {
    let (server, client, session) = setup().await;

    Mock::given(method("GET"))
        .and(path("/acl_requests"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": "Unauthorized: You lack the neccesary role to access this page"
        })))
        .mount(&server)
        .await;

    let err = client.list_requests().await.unwrap_err();
    assert!(matches!(err, Error::Forbidden { .. }));
    assert_eq!(err.status(), Some(403));
    assert!(session.is_authenticated());
}

// ── Options ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_fetch_options_appends_others() {
    let (server, client, _) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/mysql-options"))
        .and(query_param("sync", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "system_types": ["Prod"],
            "categories": [{"value": "Web", "system_type": "Prod", "display": "Web"}],
            "source_ips": [{"id": 1, "value": "10.0.0.1", "host": "web01",
                            "system_type": "Prod", "category": "Web",
                            "service": "https", "description": "frontend"}],
            "destination_ips": [],
            "services": ["https"],
            "last_sync": "2024-05-01T00:00:00"
        })))
        .mount(&server)
        .await;

    let options = client.fetch_options(true).await.unwrap();

    assert_eq!(options.system_types, vec!["Prod".to_string(), "Others".to_string()]);
    assert_eq!(options.source_ips[0].id.as_str(), "1");
    assert_eq!(options.categories[0].system_type, "Prod");
}

#[tokio::test]
async fn test_auto_populate_match() {
    let (server, client, _) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/auto-populate"))
        .and(body_partial_json(json!({"sourceIP": "10.0.0.1", "system_type": "Prod"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "source_ip": "10.0.0.1",
            "source_host": "web01",
            "destination_ip": "10.0.0.2",
            "service": "https"
        })))
        .mount(&server)
        .await;

    let query = AutoPopulateQuery {
        system_type: "Prod".into(),
        category: "Web".into(),
        source_ip: "10.0.0.1".into(),
        destination_ip: String::new(),
    };
    let found = client.auto_populate(&query).await.unwrap().unwrap();

    assert_eq!(found.source_host.as_deref(), Some("web01"));
    assert_eq!(found.destination_ip.as_deref(), Some("10.0.0.2"));
    assert_eq!(found.description, None);
}

#[tokio::test]
async fn test_auto_populate_no_match_is_none() {
    let (server, client, _) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/auto-populate"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"error": "No matching rules Found"})),
        )
        .mount(&server)
        .await;

    let query = AutoPopulateQuery {
        system_type: "Prod".into(),
        category: "Web".into(),
        destination_ip: "10.9.9.9".into(),
        ..AutoPopulateQuery::default()
    };
    assert!(client.auto_populate(&query).await.unwrap().is_none());
}

#[tokio::test]
async fn test_auto_populate_server_error_is_none() {
    let (server, client, _) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/auto-populate"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let query = AutoPopulateQuery::default();
    assert!(client.auto_populate(&query).await.unwrap().is_none());
}

// ── Validation & creation ───────────────────────────────────────────

#[tokio::test]
async fn test_validate_requests_invalid_verdict_on_400() {
    let (server, client, _) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/validate-requests"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "valid": false,
            "validation_results": [
                {"row_index": 0, "valid": true, "errors": {}},
                {"row_index": 1, "valid": false,
                 "errors": {"service": "Invalid format: 'bogus'"}}
            ],
            "error_count": 1
        })))
        .mount(&server)
        .await;

    let verdict = client
        .validate_requests(&[payload("https"), payload("bogus")])
        .await
        .unwrap();

    assert!(!verdict.valid);
    assert_eq!(verdict.error_count, 1);
    assert_eq!(verdict.validation_results[1].row_index, 1);
    assert_eq!(
        verdict.validation_results[1].errors.get("service").map(String::as_str),
        Some("Invalid format: 'bogus'")
    );
}

#[tokio::test]
async fn test_validate_requests_plain_error() {
    let (server, client, _) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/validate-requests"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"error": "No requests provided"})),
        )
        .mount(&server)
        .await;

    let err = client.validate_requests(&[]).await.unwrap_err();
    match err {
        Error::Api { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "No requests provided");
        }
        other => panic!("expected Api, got {other:?}"),
    }
}

#[tokio::test]
async fn test_create_request_body_keys() {
    let (server, client, _) = setup().await;

    Mock::given(method("POST"))
        .and(path("/create_acl_request"))
        .and(body_partial_json(json!({
            "system_type": "Prod",
            "sourceIP": "10.0.0.1",
            "destinationHost": "db01",
            "action": "allow"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "message": "ACL request created successfully",
            "request_id": 42
        })))
        .expect(1)
        .mount(&server)
        .await;

    let created = client.create_request(&payload("https")).await.unwrap();
    assert_eq!(created.request_id.unwrap().to_string(), "42");
}

// ── Review workflow ─────────────────────────────────────────────────

#[tokio::test]
async fn test_list_and_update_requests() {
    let (server, client, _) = setup().await;

    Mock::given(method("GET"))
        .and(path("/acl_requests"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "acl_requests": [{
                "id": 9, "requester": "bob", "system_type": "Prod", "category": "Web",
                "source_ip": "10.0.0.1", "destination_ip": "10.0.0.2",
                "service": "https", "reason": "frontend", "status": "Pending",
                "created_at": "2024-05-01T10:00:00", "template_id": null
            }]
        })))
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/acl_requests/9"))
        .and(body_partial_json(json!({
            "status": "Security Approval",
            "comments": "looks fine",
            "updated_by": "alice"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "updated"})))
        .expect(1)
        .mount(&server)
        .await;

    let requests = client.list_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].reason, "frontend");
    assert!(requests[0].template_id.is_none());

    client
        .update_status("9", "Security Approval", "looks fine", "alice")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_get_request_wrapped_or_bare() {
    let (server, client, _) = setup().await;

    Mock::given(method("GET"))
        .and(path("/acl_requests/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "acl_request": {"id": 1, "status": "Approved"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/acl_requests/2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": "2", "status": "Rejected"})),
        )
        .mount(&server)
        .await;

    assert_eq!(client.get_request("1").await.unwrap().status, "Approved");
    assert_eq!(client.get_request("2").await.unwrap().status, "Rejected");
}

#[tokio::test]
async fn test_get_request_not_found() {
    let (server, client, _) = setup().await;

    Mock::given(method("GET"))
        .and(path("/acl_requests/77"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "not found"})))
        .mount(&server)
        .await;

    let err = client.get_request("77").await.unwrap_err();
    assert!(err.is_not_found());
}

// ── Templates ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_grouped_templates() {
    let (server, client, _) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/templates/grouped"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "templates": [{
                "template_name": "web-stack",
                "created_by": "alice",
                "created_at": "2024-05-01T10:00:00",
                "rule_count": 2,
                "rules": [
                    {"id": 1, "template_name": "web-stack", "system_type": "Prod",
                     "category": "Web", "source_ip": "10.0.0.1", "destination_ip": "10.0.0.2",
                     "service": "https", "description": "lb", "action": "allow"},
                    {"id": 2, "template_name": "web-stack", "system_type": "Prod",
                     "category": "Web", "source_ip": "10.0.0.2", "destination_ip": "10.0.0.3",
                     "service": "5432", "description": "db", "action": "allow"}
                ]
            }],
            "count": 1
        })))
        .mount(&server)
        .await;

    let groups = client.list_template_groups().await.unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].rule_count, 2);
    assert_eq!(groups[0].rules[1].service, "5432");
}

#[tokio::test]
async fn test_list_templates_filters_locally() {
    let (server, client, _) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/templates"))
        .and(query_param("system_type", "Prod"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "templates": [
                {"id": 1, "template_name": "a", "system_type": "Prod", "category": "Web"},
                {"id": 2, "template_name": "b", "system_type": "Dev", "category": "Web"}
            ]
        })))
        .mount(&server)
        .await;

    let filter = TemplateFilter {
        system_type: Some("Prod".into()),
        ..TemplateFilter::default()
    };
    let rules = client.list_templates(&filter).await.unwrap();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].template_name, "a");
}

#[tokio::test]
async fn test_use_template() {
    let (server, client, _) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/templates/3/use"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "message": "ACL request created successfully",
            "request": {"id": 50, "template_id": 3, "template_name": "web-stack",
                        "status": "pending"}
        })))
        .mount(&server)
        .await;

    let used = client.use_template("3").await.unwrap();
    assert_eq!(used.id.to_string(), "50");
    assert_eq!(used.template_name, "web-stack");
}

// ── Reports ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_report_uses_content_disposition() {
    let (server, client, _) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/generate-xlsx"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(
                    "Content-Disposition",
                    r#"attachment; filename="acl_requests_all.xlsx""#,
                )
                .set_body_bytes(b"PK\x03\x04".to_vec()),
        )
        .mount(&server)
        .await;

    let report = client.download_report().await.unwrap();
    assert_eq!(report.filename, "acl_requests_all.xlsx");
    assert_eq!(&report.bytes[..], b"PK\x03\x04");
}

#[tokio::test]
async fn test_submission_report_fallback_name() {
    let (server, client, _) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/generate-xlsx/submission"))
        .and(body_partial_json(json!({"requests": [{"id": "42", "status": "Pending"}]})))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"xlsx".to_vec()))
        .mount(&server)
        .await;

    let record = SubmittedRecord {
        id: "42".into(),
        requester: "alice".into(),
        system_type: "Prod".into(),
        category: "Web".into(),
        source_ip: "10.0.0.1".into(),
        source_host: String::new(),
        destination_ip: "10.0.0.2".into(),
        destination_host: String::new(),
        service: "https".into(),
        description: "ACL Request".into(),
        action: "allow".into(),
        status: "Pending".into(),
    };
    let report = client.download_submission_report(&[record]).await.unwrap();

    assert!(report.filename.starts_with("acl_submission_1requests_"));
    assert!(report.filename.ends_with(".xlsx"));
}

// ── Help ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_help_is_opaque_json() {
    let (server, client, _) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/help"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"sections": {"submit": "..."}})),
        )
        .mount(&server)
        .await;

    let help = client.help().await.unwrap();
    assert!(help.get("sections").is_some());
}
