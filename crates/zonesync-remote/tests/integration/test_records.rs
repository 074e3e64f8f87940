//! Integration tests for record save/delete batches

use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, ResponseTemplate};

use zonesync_core::domain::newtypes::{RecordId, RecordVersion};
use zonesync_core::domain::record::Record;
use zonesync_core::ports::{
    IRemoteStore, RecordFailure, RecordFailureKind, RecordOperation, RecordOutcome, SavePolicy,
};

use crate::common;

fn id(name: &str) -> RecordId {
    RecordId::new(name.to_string()).unwrap()
}

fn book(name: &str, tag: Option<&str>) -> Record {
    let record = Record::new(id(name), "Book")
        .unwrap()
        .with_field("title", serde_json::json!(name));
    match tag {
        Some(tag) => record.with_version(RecordVersion::new(tag.to_string()).unwrap()),
        None => record,
    }
}

#[tokio::test]
async fn test_save_batch_returns_new_versions() {
    let (server, store) = common::setup_remote_mock().await;

    Mock::given(method("POST"))
        .and(path(common::db_path("/records/modify")))
        .and(body_partial_json(serde_json::json!({
            "zoneID": { "zoneName": "SyncZone" },
            "atomic": false,
            "operations": [
                { "operationType": "create", "record": { "recordName": "A" } },
                { "operationType": "update", "record": { "recordName": "B", "recordChangeTag": "b1" } }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "records": [
                { "recordName": "A", "recordType": "Book", "recordChangeTag": "a1" },
                { "recordName": "B", "recordType": "Book", "recordChangeTag": "b2" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let operations = vec![
        RecordOperation::Save {
            record: book("A", None),
            policy: SavePolicy::IfServerRecordUnchanged,
        },
        RecordOperation::Save {
            record: book("B", Some("b1")),
            policy: SavePolicy::IfServerRecordUnchanged,
        },
    ];

    let outcomes = store
        .modify_records(&common::zone(), &operations)
        .await
        .expect("modify failed");

    let versions: Vec<_> = outcomes
        .iter()
        .map(|o| match o {
            RecordOutcome::Saved(r) => r.version().unwrap().as_str().to_string(),
            other => panic!("unexpected outcome: {other:?}"),
        })
        .collect();
    assert_eq!(versions, vec!["a1", "b2"]);
}

#[tokio::test]
async fn test_force_update_and_delete() {
    let (server, store) = common::setup_remote_mock().await;

    Mock::given(method("POST"))
        .and(path(common::db_path("/records/modify")))
        .and(body_partial_json(serde_json::json!({
            "operations": [
                { "operationType": "forceUpdate", "record": { "recordName": "A" } },
                { "operationType": "delete", "record": { "recordName": "B" } }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "records": [
                { "recordName": "A", "recordType": "Book", "recordChangeTag": "a9" },
                { "recordName": "B", "deleted": true }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let operations = vec![
        RecordOperation::Save {
            record: book("A", Some("a1")),
            policy: SavePolicy::Overwrite,
        },
        RecordOperation::Delete { record_id: id("B") },
    ];

    let outcomes = store
        .modify_records(&common::zone(), &operations)
        .await
        .unwrap();
    assert!(matches!(&outcomes[0], RecordOutcome::Saved(r) if r.id().as_str() == "A"));
    assert_eq!(outcomes[1], RecordOutcome::Deleted(id("B")));
}

#[tokio::test]
async fn test_per_record_failures() {
    let (server, store) = common::setup_remote_mock().await;

    common::mount_post(
        &server,
        "/records/modify",
        200,
        serde_json::json!({
            "records": [
                { "recordName": "A", "serverErrorCode": "CONFLICT", "reason": "changed" },
                { "recordName": "B", "recordType": "Book", "recordChangeTag": "b2" },
                { "recordName": "C", "serverErrorCode": "NOT_FOUND", "reason": "gone" }
            ]
        }),
    )
    .await;

    let operations = vec![
        RecordOperation::Save {
            record: book("A", Some("a1")),
            policy: SavePolicy::IfServerRecordUnchanged,
        },
        RecordOperation::Save {
            record: book("B", Some("b1")),
            policy: SavePolicy::IfServerRecordUnchanged,
        },
        RecordOperation::Delete { record_id: id("C") },
    ];

    let outcomes = store
        .modify_records(&common::zone(), &operations)
        .await
        .unwrap();

    assert_eq!(
        outcomes[0],
        RecordOutcome::Failed(RecordFailure {
            record_id: id("A"),
            kind: RecordFailureKind::Conflict,
        })
    );
    assert!(matches!(outcomes[1], RecordOutcome::Saved(_)));
    assert_eq!(
        outcomes[2],
        RecordOutcome::Failed(RecordFailure {
            record_id: id("C"),
            kind: RecordFailureKind::NotFound,
        })
    );
}

#[tokio::test]
async fn test_empty_batch_makes_no_request() {
    let (server, store) = common::setup_remote_mock().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let outcomes = store.modify_records(&common::zone(), &[]).await.unwrap();
    assert!(outcomes.is_empty());
}

#[tokio::test]
async fn test_result_count_mismatch_is_invalid() {
    let (server, store) = common::setup_remote_mock().await;

    common::mount_post(&server, "/records/modify", 200, serde_json::json!({ "records": [] }))
        .await;

    let operations = vec![RecordOperation::Delete { record_id: id("A") }];
    let err = store
        .modify_records(&common::zone(), &operations)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        zonesync_core::ports::RemoteError::InvalidResponse(_)
    ));
}
