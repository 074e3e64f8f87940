//! Integration tests for initialisation and zone provisioning

use std::time::Duration;

use tokio::sync::mpsc;

use zonesync_core::config::{ConfigBuilder, IdentityStoreKind, SubscriptionPolicy};
use zonesync_core::ports::RemoteError;
use zonesync_sync::memory::{Phase, RemoteOperation};
use zonesync_sync::{ProvisionEvent, SyncError};

use crate::common;

#[tokio::test]
async fn test_initialise_twice_is_idempotent() {
    let remote = common::remote();
    let client = common::client(&remote, &common::config(200));

    let first = client.initialise().await.unwrap();
    assert!(client.is_initialised());

    let second = client.initialise().await.unwrap();
    assert!(client.is_initialised());
    assert_eq!(first, second);

    // The remote saw two zone saves, the second answered "already exists"
    assert_eq!(remote.call_count(RemoteOperation::SaveZone), 2);
    assert_eq!(remote.subscription_count(), 1);
    // The identity was resolved only once
    assert_eq!(remote.call_count(RemoteOperation::FetchIdentity), 1);
}

#[tokio::test]
async fn test_second_install_sees_existing_zone() {
    let remote = common::remote();
    common::ready_client(&remote, &common::config(200)).await;

    // A fresh client (empty identity cache) against the same account
    let other = common::client(&remote, &common::config(200));
    other.initialise().await.unwrap();
    assert!(other.is_initialised());
}

#[tokio::test(start_paused = true)]
async fn test_subscription_is_dispatched_after_zone_acknowledgement() {
    let remote = common::remote();
    remote.set_latency(RemoteOperation::SaveZone, Duration::from_millis(750));
    remote.set_latency(RemoteOperation::SaveSubscription, Duration::from_millis(10));

    common::ready_client(&remote, &common::config(200)).await;

    let provisioning: Vec<_> = remote
        .journal()
        .into_iter()
        .filter(|(op, _)| {
            matches!(op, RemoteOperation::SaveZone | RemoteOperation::SaveSubscription)
        })
        .collect();
    assert_eq!(
        provisioning,
        vec![
            (RemoteOperation::SaveZone, Phase::Started),
            (RemoteOperation::SaveZone, Phase::Finished),
            (RemoteOperation::SaveSubscription, Phase::Started),
            (RemoteOperation::SaveSubscription, Phase::Finished),
        ]
    );
}

#[tokio::test]
async fn test_identity_failure_stops_before_provisioning() {
    let remote = common::remote();
    remote.fail_next(
        RemoteOperation::FetchIdentity,
        RemoteError::Unauthorized("not signed in".into()),
    );
    let client = common::client(&remote, &common::config(200));

    let err = client.initialise().await.unwrap_err();
    assert!(matches!(
        err,
        SyncError::Transport(RemoteError::Unauthorized(_))
    ));
    assert!(!client.is_initialised());
    assert_eq!(remote.call_count(RemoteOperation::SaveZone), 0);

    // Caller-driven retry succeeds
    client.initialise().await.unwrap();
    assert!(client.is_initialised());
}

#[tokio::test]
async fn test_require_zone_policy_reports_zone_error_only() {
    let remote = common::remote();
    remote.fail_next(
        RemoteOperation::SaveZone,
        RemoteError::QuotaExceeded("account full".into()),
    );
    let (tx, mut rx) = mpsc::unbounded_channel();
    let client = common::client(&remote, &common::config(200)).with_provision_events(tx);

    let err = client.initialise().await.unwrap_err();
    assert!(matches!(
        err,
        SyncError::Transport(RemoteError::QuotaExceeded(_))
    ));
    assert!(!client.is_initialised());
    assert_eq!(remote.call_count(RemoteOperation::SaveSubscription), 0);

    assert_eq!(
        rx.recv().await,
        Some(ProvisionEvent::ZoneFailed(RemoteError::QuotaExceeded(
            "account full".into()
        )))
    );
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_always_policy_reports_zone_error_before_completion() {
    let remote = common::remote();
    // Zone already exists remotely, but this save fails in transit
    common::ready_client(&remote, &common::config(200)).await;
    remote.fail_next(
        RemoteOperation::SaveZone,
        RemoteError::Network("connection reset".into()),
    );

    let config = ConfigBuilder::new()
        .zone_subscription_policy(SubscriptionPolicy::Always)
        .identity_store(IdentityStoreKind::Memory)
        .build();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let client = common::client(&remote, &config).with_provision_events(tx);

    // The subscription still goes through, so initialisation succeeds
    client.initialise().await.unwrap();
    assert!(client.is_initialised());
    assert_eq!(remote.call_count(RemoteOperation::SaveSubscription), 2);

    assert_eq!(
        rx.recv().await,
        Some(ProvisionEvent::ZoneFailed(RemoteError::Network(
            "connection reset".into()
        )))
    );
    assert!(matches!(
        rx.recv().await,
        Some(ProvisionEvent::SubscriptionSaved(_))
    ));
}

#[tokio::test]
async fn test_subscription_failure_is_surfaced_but_zone_is_usable() {
    let remote = common::remote();
    remote.fail_next(
        RemoteOperation::SaveSubscription,
        RemoteError::Forbidden("push disabled".into()),
    );
    let client = common::client(&remote, &common::config(200));

    let err = client.initialise().await.unwrap_err();
    assert!(matches!(err, SyncError::Transport(RemoteError::Forbidden(_))));
    assert!(client.is_initialised());

    // Fetching works without a subscription
    let changes = client.fetch_record_changes(None).await.unwrap();
    assert!(changes.is_empty());
}
