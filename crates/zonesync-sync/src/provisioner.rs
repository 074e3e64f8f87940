//! Zone and subscription provisioning
//!
//! Provisioning is a two-stage pipeline. The zone task saves the sync zone
//! and, once the remote has acknowledged it, signals the subscription task
//! over a oneshot channel. The subscription task never touches the network
//! before that signal arrives, so the subscription is always dispatched after
//! the zone acknowledgement.
//!
//! Whether a failed zone save still lets the subscription through is decided
//! by [`SubscriptionPolicy`]:
//!
//! - `RequireZone`: the subscription is skipped and the zone error is the result
//! - `Always`: the subscription is dispatched anyway and its outcome is the result
//!
//! Progress is reported as [`ProvisionEvent`]s as soon as each stage finishes,
//! so a zone error can reach the host before provisioning as a whole completes.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use zonesync_core::config::{SubscriptionPolicy, ZoneConfig};
use zonesync_core::domain::newtypes::{RemoteIdentity, SubscriptionId, ZoneId, ZoneName};
use zonesync_core::ports::{IRemoteStore, RemoteError, ZoneSubscription};

use crate::error::SyncError;

/// Progress notifications emitted while provisioning
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionEvent {
    /// The zone exists remotely (created now or earlier)
    ZoneSaved(ZoneId),
    /// Saving the zone failed
    ZoneFailed(RemoteError),
    /// The change subscription was registered or replaced
    SubscriptionSaved(SubscriptionId),
    /// Registering the subscription failed
    SubscriptionFailed(RemoteError),
}

/// What each provisioning stage produced
#[derive(Debug)]
pub struct ProvisionOutcome {
    pub zone_id: ZoneId,
    /// Zone stage result; "already exists" counts as success
    pub zone: Result<(), SyncError>,
    /// Subscription stage result, `None` when it was never dispatched
    pub subscription: Option<Result<(), SyncError>>,
}

impl ProvisionOutcome {
    /// True when the zone stage released the subscription stage
    ///
    /// The client records the zone id from a dispatched outcome once both
    /// stages have finished.
    pub fn subscription_dispatched(&self) -> bool {
        self.subscription.is_some()
    }

    /// Collapses both stages into the terminal result
    pub fn into_result(self) -> Result<ZoneId, SyncError> {
        match (self.zone, self.subscription) {
            (_, Some(subscription)) => subscription.map(|()| self.zone_id),
            (Err(zone_error), None) => Err(zone_error),
            (Ok(()), None) => Err(SyncError::ProtocolInvariant(
                "zone saved but subscription stage did not run".to_string(),
            )),
        }
    }
}

// ============================================================================
// ZoneProvisioner
// ============================================================================

/// Ensures the sync zone and its change subscription exist
pub struct ZoneProvisioner {
    remote: Arc<dyn IRemoteStore>,
    zone_name: ZoneName,
    subscription_id: SubscriptionId,
    policy: SubscriptionPolicy,
    events: Option<mpsc::UnboundedSender<ProvisionEvent>>,
}

impl ZoneProvisioner {
    pub fn new(
        remote: Arc<dyn IRemoteStore>,
        zone_name: ZoneName,
        subscription_id: SubscriptionId,
    ) -> Self {
        Self {
            remote,
            zone_name,
            subscription_id,
            policy: SubscriptionPolicy::default(),
            events: None,
        }
    }

    /// Builds a provisioner from the `zone` configuration section
    pub fn from_config(remote: Arc<dyn IRemoteStore>, config: &ZoneConfig) -> anyhow::Result<Self> {
        Ok(Self::new(remote, config.zone_name()?, config.subscription_id()?)
            .with_policy(config.subscription_policy))
    }

    #[must_use]
    pub fn with_policy(mut self, policy: SubscriptionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sends progress events to `sender` in addition to returning the outcome
    #[must_use]
    pub fn with_events(mut self, sender: mpsc::UnboundedSender<ProvisionEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    pub fn policy(&self) -> SubscriptionPolicy {
        self.policy
    }

    /// The zone id this provisioner creates for `identity`
    pub fn zone_id_for(&self, identity: &RemoteIdentity) -> ZoneId {
        ZoneId::new(self.zone_name.clone(), identity.clone())
    }

    /// Provisions the zone and subscription, returning the zone id on success
    pub async fn provision(&self, identity: &RemoteIdentity) -> Result<ZoneId, SyncError> {
        self.run(identity).await.into_result()
    }

    /// Runs both stages and reports what each produced
    ///
    /// Both stages run as spawned tasks, so they complete even if the
    /// returned future is dropped.
    pub async fn run(&self, identity: &RemoteIdentity) -> ProvisionOutcome {
        let zone_id = self.zone_id_for(identity);
        let subscription = ZoneSubscription::silent(self.subscription_id.clone(), zone_id.clone());
        let (release_tx, release_rx) = oneshot::channel::<bool>();

        debug!(zone = %zone_id, policy = ?self.policy, "Provisioning sync zone");

        let zone_task = {
            let remote = Arc::clone(&self.remote);
            let events = self.events.clone();
            let zone_id = zone_id.clone();
            let policy = self.policy;
            tokio::spawn(async move {
                let result = match remote.save_zone(&zone_id).await {
                    Ok(()) => Ok(()),
                    Err(RemoteError::AlreadyExists(_)) => {
                        debug!(zone = %zone_id, "Zone already exists");
                        Ok(())
                    }
                    Err(e) => Err(e),
                };

                match &result {
                    Ok(()) => emit(&events, ProvisionEvent::ZoneSaved(zone_id.clone())),
                    Err(e) => {
                        warn!(zone = %zone_id, error = %e, "Zone save failed");
                        emit(&events, ProvisionEvent::ZoneFailed(e.clone()));
                    }
                }

                let release = result.is_ok() || policy == SubscriptionPolicy::Always;
                // The receiver only disappears if its task was aborted
                let _ = release_tx.send(release);
                result
            })
        };

        let subscription_task = {
            let remote = Arc::clone(&self.remote);
            let events = self.events.clone();
            tokio::spawn(async move {
                if !matches!(release_rx.await, Ok(true)) {
                    debug!("Subscription stage not released");
                    return None;
                }

                let result = remote.save_subscription(&subscription).await;
                match &result {
                    Ok(()) => emit(
                        &events,
                        ProvisionEvent::SubscriptionSaved(subscription.subscription_id.clone()),
                    ),
                    Err(e) => {
                        warn!(subscription = %subscription.subscription_id, error = %e, "Subscription save failed");
                        emit(&events, ProvisionEvent::SubscriptionFailed(e.clone()));
                    }
                }
                Some(result)
            })
        };

        let (zone, subscription) = tokio::join!(zone_task, subscription_task);

        let zone = match zone {
            Ok(result) => result.map_err(SyncError::from),
            Err(e) => Err(SyncError::ProtocolInvariant(format!("zone task failed: {e}"))),
        };
        let subscription = match subscription {
            Ok(result) => result.map(|r| r.map_err(SyncError::from)),
            Err(e) => Some(Err(SyncError::ProtocolInvariant(format!(
                "subscription task failed: {e}"
            )))),
        };

        if zone.is_ok() && matches!(subscription, Some(Ok(()))) {
            info!(zone = %zone_id, "Sync zone provisioned");
        }

        ProvisionOutcome {
            zone_id,
            zone,
            subscription,
        }
    }
}

fn emit(events: &Option<mpsc::UnboundedSender<ProvisionEvent>>, event: ProvisionEvent) {
    if let Some(sender) = events {
        // A host that stopped listening does not affect provisioning
        let _ = sender.send(event);
    }
}
