//! Integration tests for the zone change feed
//!
//! Verifies single-page behavior of the adapter:
//! - Initial fetch (no token)
//! - Incremental fetch (with token)
//! - Deletions and changes in one page
//! - Token expiry and missing zone

use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, ResponseTemplate};

use zonesync_core::domain::newtypes::ChangeToken;
use zonesync_core::ports::{IRemoteStore, RemoteError};

use crate::common;

#[tokio::test]
async fn test_initial_fetch_sends_no_token() {
    let (server, store) = common::setup_remote_mock().await;

    Mock::given(method("POST"))
        .and(path(common::db_path("/changes/zone")))
        .and(body_partial_json(serde_json::json!({
            "zones": [{ "zoneID": { "zoneName": "SyncZone" }, "resultsLimit": 100 }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "zones": [{
                "zoneID": { "zoneName": "SyncZone" },
                "syncToken": "token-001",
                "moreComing": false,
                "records": [
                    {
                        "recordName": "book-1",
                        "recordType": "Book",
                        "recordChangeTag": "a1",
                        "fields": { "title": { "value": "Dune" } },
                        "modified": { "timestamp": 1_768_470_000_000_i64 }
                    }
                ]
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = store
        .fetch_zone_changes(&common::zone(), None, 100)
        .await
        .expect("change fetch failed");

    assert_eq!(page.changed.len(), 1);
    assert!(page.deleted.is_empty());
    assert!(!page.more_coming);
    assert_eq!(page.change_token.unwrap().as_str(), "token-001");

    let record = &page.changed[0];
    assert_eq!(record.id().as_str(), "book-1");
    assert_eq!(record.version().unwrap().as_str(), "a1");
    assert_eq!(record.field("title"), Some(&serde_json::json!("Dune")));
}

#[tokio::test]
async fn test_incremental_fetch_sends_token_and_reports_more_coming() {
    let (server, store) = common::setup_remote_mock().await;

    Mock::given(method("POST"))
        .and(path(common::db_path("/changes/zone")))
        .and(body_partial_json(serde_json::json!({
            "zones": [{ "syncToken": "token-001" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "zones": [{
                "syncToken": "token-002",
                "moreComing": true,
                "records": [
                    { "recordName": "book-1", "deleted": true },
                    { "recordName": "book-2", "recordType": "Book", "recordChangeTag": "b1" }
                ]
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let since = ChangeToken::new("token-001".to_string()).unwrap();
    let page = store
        .fetch_zone_changes(&common::zone(), Some(&since), 100)
        .await
        .unwrap();

    assert!(page.more_coming);
    assert_eq!(page.deleted.len(), 1);
    assert_eq!(page.deleted[0].as_str(), "book-1");
    assert_eq!(page.changed.len(), 1);
    assert_eq!(page.changed[0].id().as_str(), "book-2");
    assert_eq!(page.change_token.unwrap().as_str(), "token-002");
}

#[tokio::test]
async fn test_empty_page() {
    let (server, store) = common::setup_remote_mock().await;

    common::mount_post(
        &server,
        "/changes/zone",
        200,
        serde_json::json!({ "zones": [{ "syncToken": "token-001", "records": [] }] }),
    )
    .await;

    let page = store
        .fetch_zone_changes(&common::zone(), None, 100)
        .await
        .unwrap();
    assert!(page.changed.is_empty());
    assert!(page.deleted.is_empty());
    assert_eq!(page.change_token.unwrap().as_str(), "token-001");
}

#[tokio::test]
async fn test_expired_token_error_code() {
    let (server, store) = common::setup_remote_mock().await;

    common::mount_post(
        &server,
        "/changes/zone",
        200,
        serde_json::json!({
            "zones": [{ "serverErrorCode": "CHANGE_TOKEN_EXPIRED", "reason": "reset" }]
        }),
    )
    .await;

    let since = ChangeToken::new("stale".to_string()).unwrap();
    let err = store
        .fetch_zone_changes(&common::zone(), Some(&since), 100)
        .await
        .unwrap_err();
    assert_eq!(err, RemoteError::ChangeTokenExpired);
}

#[tokio::test]
async fn test_expired_token_410_gone() {
    let (server, store) = common::setup_remote_mock().await;

    Mock::given(method("POST"))
        .and(path(common::db_path("/changes/zone")))
        .respond_with(ResponseTemplate::new(410))
        .mount(&server)
        .await;

    let since = ChangeToken::new("stale".to_string()).unwrap();
    let err = store
        .fetch_zone_changes(&common::zone(), Some(&since), 100)
        .await
        .unwrap_err();
    assert_eq!(err, RemoteError::ChangeTokenExpired);
}

#[tokio::test]
async fn test_zone_not_found() {
    let (server, store) = common::setup_remote_mock().await;

    common::mount_post(
        &server,
        "/changes/zone",
        200,
        serde_json::json!({ "zones": [{ "serverErrorCode": "ZONE_NOT_FOUND" }] }),
    )
    .await;

    let err = store
        .fetch_zone_changes(&common::zone(), None, 100)
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteError::ZoneNotFound(_)));
}
