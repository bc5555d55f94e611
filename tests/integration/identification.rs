//! Identification workflow integration

use super::*;
use liblynx_connect::{ErrorKind, IdentificationRequest, InMemoryCache};
use wiremock::matchers::body_json;

fn identification_endpoint() -> MockBuilder {
    Mock::given(method("POST"))
        .and(path("/api/identifications"))
        .and(header("authorization", format!("Bearer {ACCESS_TOKEN}").as_str()))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"ip": "1.2.3.4", "url": "http://example.com"})))
}

fn request() -> IdentificationRequest {
    IdentificationRequest::new()
        .ip("1.2.3.4")
        .url("http://example.com")
}

#[tokio::test]
async fn test_cold_then_warm_authorize() {
    let server = MockServer::start().await;

    token_endpoint()
        .respond_with(json_response(200, token_body()))
        .expect(1)
        .mount(&server)
        .await;
    entrypoint_endpoint()
        .respond_with(json_response(200, entrypoint_body(&server)))
        .expect(1)
        .mount(&server)
        .await;
    identification_endpoint()
        .respond_with(json_response(
            200,
            json!({
                "id": "6fa62f8ab5ea0ba00f5b07baeb1f1df2",
                "ip": "1.2.3.4",
                "url": "http://example.com",
                "status": "identified",
                "account": {"account_name": "Example University"},
                "_links": {"self": {"href": format!("{}/api/identifications/6fa62f8ab5ea0ba00f5b07baeb1f1df2", server.uri())}}
            }),
        ))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(InMemoryCache::new()));

    let first = client.authorize(&request()).await.unwrap().unwrap();
    assert!(first.is_identified());
    assert_eq!(first.account_name(), Some("Example University"));

    let second = client.authorize(&request()).await.unwrap().unwrap();
    assert_eq!(second.id(), first.id());
}

#[tokio::test]
async fn test_second_client_on_shared_cache_goes_straight_to_identification() {
    let server = MockServer::start().await;

    token_endpoint()
        .respond_with(json_response(200, token_body()))
        .expect(1)
        .mount(&server)
        .await;
    entrypoint_endpoint()
        .respond_with(json_response(200, entrypoint_body(&server)))
        .expect(1)
        .mount(&server)
        .await;
    identification_endpoint()
        .respond_with(json_response(
            200,
            json!({
                "id": "1fd03a8e5d4dbad4146a38ba15db82c7",
                "status": "wayf",
                "_links": {"wayf": {"href": "http://x/wayf/123"}}
            }),
        ))
        .expect(2)
        .mount(&server)
        .await;

    let cache = Arc::new(InMemoryCache::new());
    client_for(&server, cache.clone())
        .authorize(&request())
        .await
        .unwrap();

    let identification = client_for(&server, cache)
        .authorize(&request())
        .await
        .unwrap()
        .unwrap();
    assert!(identification.requires_wayf());
    assert_eq!(identification.wayf_url().unwrap(), "http://x/wayf/123");
}

#[tokio::test]
async fn test_validation_failure_is_absent() {
    let server = MockServer::start().await;

    token_endpoint()
        .respond_with(json_response(200, token_body()))
        .mount(&server)
        .await;
    entrypoint_endpoint()
        .respond_with(json_response(200, entrypoint_body(&server)))
        .mount(&server)
        .await;
    identification_endpoint()
        .respond_with(json_response(
            400,
            json!({"status_code": 400, "message": "Validation Failed", "errors": {}}),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(InMemoryCache::new()));
    assert!(client.authorize(&request()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_entry_point_server_error() {
    let server = MockServer::start().await;

    token_endpoint()
        .respond_with(json_response(200, token_body()))
        .mount(&server)
        .await;
    entrypoint_endpoint()
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(InMemoryCache::new()));
    let err = client.authorize(&request()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Api);
    assert_eq!(err.status(), Some(500));
}
