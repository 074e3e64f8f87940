//! Integration tests for HTTP failure classification

use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use zonesync_core::ports::{IRemoteStore, RemoteError};
use zonesync_remote::{HttpRemoteStore, RemoteClient};

use crate::common;

async fn identity_error(template: ResponseTemplate) -> RemoteError {
    let (server, store) = common::setup_remote_mock().await;

    Mock::given(method("GET"))
        .and(path(common::db_path("/users/current")))
        .respond_with(template)
        .mount(&server)
        .await;

    store.fetch_current_identity().await.unwrap_err()
}

#[tokio::test]
async fn test_429_surfaces_retry_after_without_retrying() {
    let (server, store) = common::setup_remote_mock().await;

    Mock::given(method("GET"))
        .and(path(common::db_path("/users/current")))
        .respond_with(ResponseTemplate::new(429).append_header("Retry-After", "12"))
        .expect(1)
        .mount(&server)
        .await;

    let err = store.fetch_current_identity().await.unwrap_err();
    assert_eq!(
        err,
        RemoteError::TooManyRequests {
            retry_after: Duration::from_secs(12)
        }
    );
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_403_forbidden() {
    let err = identity_error(ResponseTemplate::new(403)).await;
    assert!(matches!(err, RemoteError::Forbidden(_)));
}

#[tokio::test]
async fn test_503_server_error() {
    let err = identity_error(ResponseTemplate::new(503)).await;
    assert!(matches!(err, RemoteError::ServerError(_)));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_error_body_code_takes_precedence() {
    let err = identity_error(ResponseTemplate::new(400).set_body_json(serde_json::json!({
        "serverErrorCode": "QUOTA_EXCEEDED",
        "reason": "account is full"
    })))
    .await;
    assert_eq!(err, RemoteError::QuotaExceeded("account is full".to_string()));
}

#[tokio::test]
async fn test_malformed_json_is_invalid_response() {
    let err = identity_error(ResponseTemplate::new(200).set_body_string("not json")).await;
    assert!(matches!(err, RemoteError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    // Port 9 (discard) on localhost is closed in test environments
    let store = HttpRemoteStore::new(RemoteClient::with_base_url(
        common::TOKEN,
        "http://127.0.0.1:9/database/1/c/development/private",
    ));

    let err = store.fetch_current_identity().await.unwrap_err();
    assert!(matches!(err, RemoteError::Network(_)));
}
