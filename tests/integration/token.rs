//! Token endpoint integration

use super::*;
use liblynx_connect::{ErrorKind, InMemoryCache, LibLynxError};

#[tokio::test]
async fn test_token_granted_once_across_requests() {
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

    let client = client_for(&server, Arc::new(InMemoryCache::new()));
    let url = client.resolve("@new_identification").await.unwrap();
    assert_eq!(url, format!("{}/api/identifications", server.uri()));

    client.resolve("@new_identification").await.unwrap();
    assert!(client.authenticator().store().has_token().await.unwrap());
}

#[tokio::test]
async fn test_rejected_credentials() {
    let server = MockServer::start().await;

    token_endpoint()
        .respond_with(json_response(
            401,
            json!({"error": "invalid_client", "error_description": "Unknown client"}),
        ))
        .expect(1)
        .mount(&server)
        .await;
    entrypoint_endpoint()
        .respond_with(json_response(200, entrypoint_body(&server)))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(InMemoryCache::new()));
    let err = client.resolve("@new_identification").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authentication);
    assert_eq!(err.status(), Some(401));
    assert!(matches!(err, LibLynxError::Authentication(_)));
}

#[tokio::test]
async fn test_unreachable_token_endpoint() {
    let server = MockServer::start().await;
    let client = client_for(&server, Arc::new(InMemoryCache::new()));
    drop(server);

    let err = client.resolve("@new_identification").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authentication);
}
