//! API Token Service Tests
//!
//! Tests for TokenService list/get/create/revoke against a wiremock Central.

use serde_json::{json, Value};
use stackrox_sdk::{ConnectionConfig, Credentials, ErrorKind, StackroxError, TokenService};
use wiremock::{
    matchers::{any, body_json, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

fn service(server: &MockServer) -> TokenService {
    let config = ConnectionConfig::new(server.uri(), Credentials::Bearer("test-token".to_string()));
    TokenService::new(&config).unwrap()
}

fn token(id: &str, name: &str, revoked: bool) -> Value {
    json!({
        "id": id,
        "name": name,
        "role": "Continuous Integration",
        "revoked": revoked,
        "issuedAt": "2024-01-01T00:00:00Z",
        "expiration": "2025-01-01T00:00:00Z"
    })
}

async fn mount_list(server: &MockServer, include_revoked: &str, tokens: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path("/v1/apitokens"))
        .and(query_param("revoked", include_revoked))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "tokens": tokens })))
        .mount(server)
        .await;
}

async fn forbid_patch(server: &MockServer) {
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(server)
        .await;
}

// ============================================================================
// List Tests
// ============================================================================

#[tokio::test]
async fn test_list_excludes_revoked_by_default() {
    let mock_server = MockServer::start().await;
    mount_list(
        &mock_server,
        "false",
        vec![
            token("t1", "ci", false),
            token("t2", "deploy", false),
            // stale server answer; must still be filtered out
            token("t3", "old", true),
        ],
    )
    .await;

    let tokens = service(&mock_server).list(false).await.unwrap();

    assert_eq!(tokens.len(), 2);
    assert!(tokens.iter().all(|t| !t.revoked()));
}

#[tokio::test]
async fn test_list_including_revoked() {
    let mock_server = MockServer::start().await;
    mount_list(
        &mock_server,
        "true",
        vec![token("t1", "ci", false), token("t3", "old", true)],
    )
    .await;

    let tokens = service(&mock_server).list(true).await.unwrap();

    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[1].id, "t3");
    assert!(tokens[1].revoked());
    assert_eq!(tokens[0].issued_at(), Some("2024-01-01T00:00:00Z"));
}

#[tokio::test]
async fn test_list_returns_records_as_sent() {
    let mock_server = MockServer::start().await;
    let record = json!({
        "id": "t1",
        "name": "ci",
        "roles": ["Admin", "Analyst"],
        "revoked": false,
        "issuedAt": null
    });
    mount_list(&mock_server, "false", vec![record.clone()]).await;

    let tokens = service(&mock_server).list(false).await.unwrap();

    assert_eq!(serde_json::to_value(&tokens[0]).unwrap(), record);
    assert_eq!(tokens[0].role(), None);
    assert_eq!(tokens[0].roles(), vec!["Admin", "Analyst"]);
}

// ============================================================================
// Get Tests
// ============================================================================

#[tokio::test]
async fn test_get_by_id_fetches_directly() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/apitokens/t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token("t1", "ci", false)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let tokens = service(&mock_server)
        .get(Some("ignored-name"), Some("t1"), false)
        .await
        .unwrap();

    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].id, "t1");
    assert_eq!(tokens[0].name, "ci");
}

#[tokio::test]
async fn test_get_by_id_applies_revoked_predicate() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/apitokens/t3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token("t3", "old", true)))
        .expect(2)
        .mount(&mock_server)
        .await;

    let service = service(&mock_server);

    let hidden = service.get(None, Some("t3"), false).await.unwrap();
    assert!(hidden.is_empty());

    let shown = service.get(None, Some("t3"), true).await.unwrap();
    assert_eq!(shown.len(), 1);
    assert!(shown[0].revoked());
}

#[tokio::test]
async fn test_get_by_name_returns_every_match() {
    let mock_server = MockServer::start().await;
    mount_list(
        &mock_server,
        "false",
        vec![
            token("t1", "ci", false),
            token("t2", "ci", false),
            token("t3", "deploy", false),
            token("t4", "ci-extra", false),
        ],
    )
    .await;

    let tokens = service(&mock_server)
        .get(Some("ci"), None, false)
        .await
        .unwrap();

    let ids: Vec<&str> = tokens.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["t1", "t2"]);
}

#[tokio::test]
async fn test_get_by_name_with_no_match_is_empty() {
    let mock_server = MockServer::start().await;
    mount_list(&mock_server, "false", vec![token("t1", "ci", false)]).await;

    let tokens = service(&mock_server)
        .get(Some("nope"), None, false)
        .await
        .unwrap();

    assert!(tokens.is_empty());
}

#[tokio::test]
async fn test_get_without_name_or_id_is_invalid_argument() {
    let mock_server = MockServer::start().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let err = service(&mock_server).get(None, None, false).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let err = service(&mock_server)
        .get(Some(""), Some(""), false)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

// ============================================================================
// Create Tests
// ============================================================================

#[tokio::test]
async fn test_create_posts_name_and_role() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/apitokens/generate"))
        .and(body_json(json!({"name": "ci", "role": "Admin"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "eyJhbGciOiJSUzI1NiJ9.secret",
            "metadata": token("t9", "ci", false)
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let created = service(&mock_server).create("ci", "Admin").await.unwrap();
    let metadata = created.metadata().unwrap();

    assert_eq!(metadata.id, "t9");
    assert_eq!(metadata.name, "ci");
    assert_eq!(created.token(), Some("eyJhbGciOiJSUzI1NiJ9.secret"));
}

#[tokio::test]
async fn test_create_returns_response_as_sent() {
    let mock_server = MockServer::start().await;
    let response = json!({
        "token": "eyJhbGciOiJSUzI1NiJ9.secret",
        "metadata": {
            "id": "t9",
            "name": "ci",
            "roles": ["Admin"],
            "revoked": false,
            "expiration": null
        },
        "warning": "token expires in 30 days"
    });

    Mock::given(method("POST"))
        .and(path("/v1/apitokens/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&response))
        .mount(&mock_server)
        .await;

    let created = service(&mock_server).create("ci", "Admin").await.unwrap();

    assert_eq!(serde_json::to_value(&created).unwrap(), response);
    assert!(!format!("{:?}", created).contains("secret"));
}

#[tokio::test]
async fn test_create_accepts_flat_token_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/apitokens/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token("t9", "ci", false)))
        .mount(&mock_server)
        .await;

    let created = service(&mock_server).create("ci", "Admin").await.unwrap();

    assert_eq!(created.id().as_deref(), Some("t9"));
    assert!(created.token().is_none());
}

// ============================================================================
// Revoke Tests
// ============================================================================

#[tokio::test]
async fn test_revoke_by_id() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/v1/apitokens/revoke/t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let revoked = service(&mock_server).revoke(Some("t1"), None).await.unwrap();
    assert!(revoked);
}

#[tokio::test]
async fn test_revoke_by_unique_name_resolves_id() {
    let mock_server = MockServer::start().await;
    mount_list(
        &mock_server,
        "false",
        vec![token("t1", "ci", false), token("t2", "deploy", false)],
    )
    .await;

    Mock::given(method("PATCH"))
        .and(path("/v1/apitokens/revoke/t2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let revoked = service(&mock_server)
        .revoke(None, Some("deploy"))
        .await
        .unwrap();
    assert!(revoked);
}

#[tokio::test]
async fn test_revoke_by_shared_name_is_ambiguous_and_sends_no_patch() {
    let mock_server = MockServer::start().await;
    mount_list(
        &mock_server,
        "false",
        vec![token("t1", "ci", false), token("t2", "ci", false)],
    )
    .await;
    forbid_patch(&mock_server).await;

    let err = service(&mock_server)
        .revoke(None, Some("ci"))
        .await
        .unwrap_err();

    match err {
        StackroxError::AmbiguousMatch { name, count } => {
            assert_eq!(name, "ci");
            assert_eq!(count, 2);
        }
        other => panic!("Expected AmbiguousMatch, got {:?}", other),
    }
}

#[tokio::test]
async fn test_revoke_by_unknown_name_is_not_found_and_sends_no_patch() {
    let mock_server = MockServer::start().await;
    mount_list(&mock_server, "false", vec![token("t1", "ci", false)]).await;
    forbid_patch(&mock_server).await;

    let err = service(&mock_server)
        .revoke(None, Some("nope"))
        .await
        .unwrap_err();

    // the name lookup went out, so this is not an argument error
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_revoke_without_id_or_name_is_invalid_argument() {
    let mock_server = MockServer::start().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let err = service(&mock_server).revoke(None, None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[tokio::test]
async fn test_revoke_propagates_unauthorized() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/v1/apitokens/revoke/t1"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let err = service(&mock_server)
        .revoke(Some("t1"), None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
}
