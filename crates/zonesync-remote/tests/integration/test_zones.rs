//! Integration tests for zone and subscription registration

use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, ResponseTemplate};

use zonesync_core::domain::newtypes::SubscriptionId;
use zonesync_core::ports::{IRemoteStore, RemoteError, ZoneSubscription};

use crate::common;

#[tokio::test]
async fn test_save_zone_sends_create_operation() {
    let (server, store) = common::setup_remote_mock().await;

    Mock::given(method("POST"))
        .and(path(common::db_path("/zones/modify")))
        .and(body_partial_json(serde_json::json!({
            "operations": [{
                "operationType": "create",
                "zone": { "zoneID": { "zoneName": "SyncZone", "ownerRecordName": "_owner" } }
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "zones": [{ "zoneID": { "zoneName": "SyncZone" } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    store
        .save_zone(&common::zone())
        .await
        .expect("zone creation failed");
}

#[tokio::test]
async fn test_save_zone_already_exists() {
    let (server, store) = common::setup_remote_mock().await;

    common::mount_post(
        &server,
        "/zones/modify",
        200,
        serde_json::json!({
            "zones": [{ "serverErrorCode": "ZONE_ALREADY_EXISTS", "reason": "zone exists" }]
        }),
    )
    .await;

    let err = store.save_zone(&common::zone()).await.unwrap_err();
    assert_eq!(err, RemoteError::AlreadyExists("zone exists".to_string()));
}

#[tokio::test]
async fn test_save_subscription_replaces_by_id() {
    let (server, store) = common::setup_remote_mock().await;

    Mock::given(method("POST"))
        .and(path(common::db_path("/subscriptions/modify")))
        .and(body_partial_json(serde_json::json!({
            "operations": [{
                "operationType": "replace",
                "subscription": {
                    "subscriptionID": "SyncZoneChanges",
                    "subscriptionType": "zone",
                    "notificationInfo": { "shouldSendContentAvailable": true }
                }
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "subscriptions": [{ "subscriptionID": "SyncZoneChanges" }]
        })))
        .expect(2)
        .mount(&server)
        .await;

    let subscription = ZoneSubscription::silent(
        SubscriptionId::new("SyncZoneChanges".to_string()).unwrap(),
        common::zone(),
    );

    // Saving twice is a replace, not an error
    store.save_subscription(&subscription).await.unwrap();
    store.save_subscription(&subscription).await.unwrap();
}

#[tokio::test]
async fn test_save_subscription_zone_missing() {
    let (server, store) = common::setup_remote_mock().await;

    common::mount_post(
        &server,
        "/subscriptions/modify",
        200,
        serde_json::json!({
            "subscriptions": [{ "serverErrorCode": "ZONE_NOT_FOUND", "reason": "no zone" }]
        }),
    )
    .await;

    let subscription = ZoneSubscription::silent(
        SubscriptionId::new("SyncZoneChanges".to_string()).unwrap(),
        common::zone(),
    );
    let err = store.save_subscription(&subscription).await.unwrap_err();
    assert!(matches!(err, RemoteError::ZoneNotFound(_)));
}
