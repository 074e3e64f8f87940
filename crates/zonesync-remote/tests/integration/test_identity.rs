//! Integration tests for the current-user identity lookup

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

use zonesync_core::ports::{IRemoteStore, RemoteError};

use crate::common;

#[tokio::test]
async fn test_fetch_current_identity() {
    let (server, store) = common::setup_remote_mock().await;

    Mock::given(method("GET"))
        .and(path(common::db_path("/users/current")))
        .and(header("authorization", format!("Bearer {}", common::TOKEN).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "userRecordName": "_d1f5e0c2a7"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let identity = store
        .fetch_current_identity()
        .await
        .expect("identity lookup failed");
    assert_eq!(identity.as_str(), "_d1f5e0c2a7");
}

#[tokio::test]
async fn test_fetch_current_identity_missing_name_is_invalid() {
    let (server, store) = common::setup_remote_mock().await;

    Mock::given(method("GET"))
        .and(path(common::db_path("/users/current")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;

    let err = store.fetch_current_identity().await.unwrap_err();
    assert!(matches!(err, RemoteError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_fetch_current_identity_unauthorized() {
    let (server, store) = common::setup_remote_mock().await;

    Mock::given(method("GET"))
        .and(path(common::db_path("/users/current")))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = store.fetch_current_identity().await.unwrap_err();
    assert!(matches!(err, RemoteError::Unauthorized(_)));
}
