//! Metadata registration against a stub metadata service

mod common;

use cloud_upload::{register_file, CloudClient, CloudConfig, CloudError};
use common::*;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_register_sends_strict_form() {
    let _ = env_logger::try_init();

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(FILE_ADD_PATH))
        .and(body_string_contains("token=test-token"))
        .and(body_string_contains("home=%2Fdocs%2Freport+2024.pdf"))
        .and(body_string_contains("conflict=strict"))
        .and(body_string_contains("hash=ABCDEF0123"))
        .and(body_string_contains("size=00042"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    register_file(&client, "/docs/report 2024.pdf", "ABCDEF0123", "00042")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_register_rejection_keeps_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(FILE_ADD_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_string("{\"error\":\"token expired\"}"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = register_file(&client, "/a.bin", "ABC", "1")
        .await
        .unwrap_err();

    match err {
        CloudError::Rejected {
            operation,
            status,
            body,
        } => {
            assert_eq!(operation, "file/add");
            assert_eq!(status, 403);
            assert_eq!(body, "{\"error\":\"token expired\"}");
        }
        other => panic!("Expected Rejected error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_register_transport_failure() {
    // Nothing listens on port 1.
    let client = CloudClient::new(CloudConfig::new().api_base_url("http://127.0.0.1:1/api/v2/"))
        .unwrap()
        .with_auth_token(TOKEN);

    let err = register_file(&client, "/a.bin", "ABC", "1")
        .await
        .unwrap_err();

    match err {
        CloudError::Transport { operation, .. } => assert_eq!(operation, "file/add"),
        other => panic!("Expected Transport error, got {other:?}"),
    }
}
