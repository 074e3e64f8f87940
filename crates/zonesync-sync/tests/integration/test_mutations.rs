//! Integration tests for uploads and deletes

use zonesync_core::ports::RemoteError;
use zonesync_sync::mutation::NOT_FOUND_CODE;
use zonesync_sync::SyncError;

use crate::common;

#[tokio::test]
async fn test_stale_upload_is_a_conflict_not_an_overwrite() {
    let remote = common::remote();
    let phone = common::ready_client(&remote, &common::config(200)).await;
    let laptop = common::ready_client(&remote, &common::config(200)).await;

    let saved = phone.upload(&[common::book("A", "Dune")]).await.unwrap();

    // The laptop picks the record up and edits it
    let on_laptop = laptop.fetch_record_changes(None).await.unwrap();
    let mut edited = on_laptop.changed_records()[0].clone();
    edited.set_field("title", serde_json::json!("Dune (annotated)"));
    laptop.upload(&[edited]).await.unwrap();

    // The phone still holds the old version
    let mut stale = saved[0].clone();
    stale.set_field("title", serde_json::json!("Dune (2nd ed.)"));
    let err = phone.upload(&[stale.clone()]).await.unwrap_err();
    match &err {
        SyncError::Conflict { record_ids } => assert_eq!(record_ids, &vec![common::id("A")]),
        other => panic!("expected conflict, got {other:?}"),
    }
    assert!(!err.is_retryable());

    let stored = remote
        .record(&phone.zone_id().unwrap(), &common::id("A"))
        .unwrap();
    assert_eq!(stored.field("title"), Some(&serde_json::json!("Dune (annotated)")));

    // Re-fetch, re-apply, re-upload
    let latest = phone.fetch_record_changes(None).await.unwrap();
    let mut rebased = latest.changed_records()[0].clone();
    rebased.set_field("title", serde_json::json!("Dune (2nd ed.)"));
    phone.upload(&[rebased]).await.unwrap();
}

#[tokio::test]
async fn test_conflict_in_mixed_batch_fails_whole_batch() {
    let remote = common::remote();
    let client = common::ready_client(&remote, &common::config(200)).await;
    let saved = client.upload(&[common::book("A", "Dune")]).await.unwrap();
    remote
        .write_from_other_device(&client.zone_id().unwrap(), saved[0].clone())
        .unwrap();

    let err = client
        .upload(&[saved[0].clone(), common::book("B", "Emma")])
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Conflict { ref record_ids } if record_ids == &vec![common::id("A")]));

    // Non-atomic batch: B was accepted and shows up in the feed
    let changes = client.fetch_record_changes(None).await.unwrap();
    assert!(common::changed_names(&changes).contains(&"B".to_string()));
}

#[tokio::test]
async fn test_force_upload_wins_over_concurrent_edit() {
    let remote = common::remote();
    let client = common::ready_client(&remote, &common::config(200)).await;
    let saved = client.upload(&[common::book("A", "Dune")]).await.unwrap();
    remote
        .write_from_other_device(&client.zone_id().unwrap(), saved[0].clone())
        .unwrap();

    let forced = client.force_upload(&saved).await.unwrap();
    assert_ne!(forced[0].version(), saved[0].version());
}

#[tokio::test]
async fn test_deleting_unknown_record_is_rejected() {
    let remote = common::remote();
    let client = common::ready_client(&remote, &common::config(200)).await;

    let err = client.remove(&[common::id("ghost")]).await.unwrap_err();
    match err {
        SyncError::Transport(RemoteError::RecordRejected {
            record_id, code, ..
        }) => {
            assert_eq!(record_id, common::id("ghost"));
            assert_eq!(code, NOT_FOUND_CODE);
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test]
async fn test_creating_existing_record_without_version_conflicts() {
    let remote = common::remote();
    let client = common::ready_client(&remote, &common::config(200)).await;
    client.upload(&[common::book("A", "Dune")]).await.unwrap();

    let err = client.upload(&[common::book("A", "Other")]).await.unwrap_err();
    assert!(matches!(err, SyncError::Conflict { .. }));
}
