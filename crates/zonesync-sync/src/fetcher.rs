//! Incremental change fetching
//!
//! [`ChangeFetcher`] pulls every page of a zone's change feed after a given
//! token and assembles a single [`ChangeCollection`]. Pages are requested
//! back to back, each one resuming from the token of the page before it.
//!
//! A fetch either returns the whole collection or an error. Records gathered
//! from earlier pages are dropped when a later page fails, and the caller
//! retries from the last token it persisted.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use zonesync_core::domain::newtypes::{ChangeToken, RecordId, ZoneId};
use zonesync_core::domain::ChangeCollection;
use zonesync_core::ports::IRemoteStore;

use crate::error::SyncError;

/// Per-item notifications emitted while a fetch is in progress
///
/// These are informational: a fetch that later fails still emits the events
/// of the pages it received, but returns no collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchEvent {
    RecordChanged(RecordId),
    RecordDeleted(RecordId),
    /// Token of a page after which more pages follow
    TokenUpdated(ChangeToken),
}

/// Fetches a zone's changes since a token
pub struct ChangeFetcher {
    remote: Arc<dyn IRemoteStore>,
    results_limit: u32,
}

impl ChangeFetcher {
    pub fn new(remote: Arc<dyn IRemoteStore>, results_limit: u32) -> Self {
        Self {
            remote,
            results_limit,
        }
    }

    pub fn results_limit(&self) -> u32 {
        self.results_limit
    }

    /// Fetches every change after `since`, or the whole zone when `since` is `None`
    pub async fn fetch(
        &self,
        zone_id: &ZoneId,
        since: Option<&ChangeToken>,
    ) -> Result<ChangeCollection, SyncError> {
        self.fetch_inner(zone_id, since, None).await
    }

    /// Like [`fetch`](Self::fetch), also streaming per-item events to `events`
    pub async fn fetch_with_events(
        &self,
        zone_id: &ZoneId,
        since: Option<&ChangeToken>,
        events: &mpsc::UnboundedSender<FetchEvent>,
    ) -> Result<ChangeCollection, SyncError> {
        self.fetch_inner(zone_id, since, Some(events)).await
    }

    async fn fetch_inner(
        &self,
        zone_id: &ZoneId,
        since: Option<&ChangeToken>,
        events: Option<&mpsc::UnboundedSender<FetchEvent>>,
    ) -> Result<ChangeCollection, SyncError> {
        let mut changed = Vec::new();
        let mut deleted = Vec::new();
        let mut cursor = since.cloned();
        let mut pages = 0usize;

        debug!(zone = %zone_id, from_start = since.is_none(), "Fetching zone changes");

        loop {
            let page = self
                .remote
                .fetch_zone_changes(zone_id, cursor.as_ref(), self.results_limit)
                .await?;
            pages += 1;

            debug!(
                page = pages,
                changed = page.changed.len(),
                deleted = page.deleted.len(),
                more_coming = page.more_coming,
                "Received change page"
            );

            if let Some(sender) = events {
                for record in &page.changed {
                    let _ = sender.send(FetchEvent::RecordChanged(record.id().clone()));
                }
                for id in &page.deleted {
                    let _ = sender.send(FetchEvent::RecordDeleted(id.clone()));
                }
            }
            changed.extend(page.changed);
            deleted.extend(page.deleted);

            match (page.more_coming, page.change_token) {
                (true, Some(token)) => {
                    if cursor.as_ref() == Some(&token) {
                        return Err(SyncError::ProtocolInvariant(format!(
                            "change feed did not advance past token {token}"
                        )));
                    }
                    if let Some(sender) = events {
                        let _ = sender.send(FetchEvent::TokenUpdated(token.clone()));
                    }
                    cursor = Some(token);
                }
                (true, None) => {
                    return Err(SyncError::ProtocolInvariant(
                        "change page announced more pages without a change token".to_string(),
                    ));
                }
                (false, Some(token)) => {
                    info!(
                        zone = %zone_id,
                        pages,
                        changed = changed.len(),
                        deleted = deleted.len(),
                        "Fetched zone changes"
                    );
                    return Ok(ChangeCollection::new(changed, deleted, token));
                }
                (false, None) => {
                    return Err(SyncError::ProtocolInvariant(
                        "fetch completed without a change token".to_string(),
                    ));
                }
            }
        }
    }
}
