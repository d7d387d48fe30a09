//! HTTP client tests against a mock Anaml server

use anaml_provider::{AnamlApi, ClientError, HttpClient, ProviderConfig};
use serde_json::json;
use url::Url;
use wiremock::matchers::{basic_auth, body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer, branch: Option<&str>) -> HttpClient {
    HttpClient::new(ProviderConfig {
        host: Url::parse(&server.uri()).unwrap(),
        username: "admin".to_string(),
        password: "secret".to_string(),
        branch: branch.map(str::to_string),
    })
    .unwrap()
}

#[tokio::test]
async fn test_get_returns_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/entity/4"))
        .and(basic_auth("admin", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 4, "name": "customer"})))
        .expect(1)
        .mount(&server)
        .await;

    let record = client(&server, None).get("entity", 4).await.unwrap();
    assert_eq!(record, Some(json!({"id": 4, "name": "customer"})));
}

#[tokio::test]
async fn test_get_missing_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/entity/99"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    assert_eq!(client(&server, None).get("entity", 99).await.unwrap(), None);
}

#[tokio::test]
async fn test_create_returns_new_id() {
    let server = MockServer::start().await;
    let body = json!({"name": "customer", "adt_type": "base", "defaultColumn": "id"});
    Mock::given(method("POST"))
        .and(path("/entity"))
        .and(body_json(body.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 12})))
        .mount(&server)
        .await;

    assert_eq!(client(&server, None).create("entity", &body).await.unwrap(), 12);
}

#[tokio::test]
async fn test_create_without_id_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/entity"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let err = client(&server, None)
        .create("entity", &json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Decode(_)));
}

#[tokio::test]
async fn test_update_sends_branch() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/source/3"))
        .and(query_param("branch", "feature"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client(&server, Some("feature"))
        .update("source", 3, &json!({"id": 3, "name": "s"}))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_delete_missing_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/source/3"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client(&server, None).delete("source", 3).await.unwrap_err();
    assert!(matches!(err, ClientError::NotFound(_)));
}

#[tokio::test]
async fn test_server_error_carries_status() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/source/3"))
        .respond_with(ResponseTemplate::new(500).set_body_string("x".repeat(400)))
        .mount(&server)
        .await;

    match client(&server, None).delete("source", 3).await {
        Err(ClientError::Status { status, body }) => {
            assert_eq!(status, 500);
            assert!(body.ends_with("[truncated, 400 bytes total]"));
        }
        other => panic!("Expected Status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_find_by_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cluster"))
        .and(query_param("name", "spark"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 9, "name": "spark"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cluster"))
        .and(query_param("name", "missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client(&server, None);
    let found = client.find_by_name("cluster", "spark").await.unwrap();
    assert_eq!(found.unwrap()["id"], 9);
    assert_eq!(client.find_by_name("cluster", "missing").await.unwrap(), None);
}
