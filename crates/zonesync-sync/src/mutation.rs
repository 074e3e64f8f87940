//! Batched record mutations
//!
//! Each call sends exactly one modify batch. The remote answers per record;
//! [`MutationClient`] folds those answers into one batch-level result:
//!
//! - any version conflict fails the batch with [`SyncError::Conflict`],
//!   listing every conflicting record; a conflict answer to the whole
//!   request fails it the same way
//! - otherwise the first other rejection fails the batch with
//!   [`RemoteError::RecordRejected`]
//!
//! Records that were accepted in a failed batch stay accepted remotely. The
//! next fetch delivers them with their new versions.

use std::sync::Arc;

use tracing::{debug, info, warn};

use zonesync_core::domain::newtypes::{RecordId, ZoneId};
use zonesync_core::domain::Record;
use zonesync_core::ports::{
    IRemoteStore, RecordFailureKind, RecordOperation, RecordOutcome, RemoteError, SavePolicy,
};

use crate::error::SyncError;

/// Code reported for a batch entry whose record does not exist
pub const NOT_FOUND_CODE: &str = "NOT_FOUND";

/// Uploads and deletes records in single batches
pub struct MutationClient {
    remote: Arc<dyn IRemoteStore>,
}

impl MutationClient {
    pub fn new(remote: Arc<dyn IRemoteStore>) -> Self {
        Self { remote }
    }

    /// Saves `records`, each only if its stored version still matches
    ///
    /// Returns the records as stored, carrying their new versions.
    pub async fn upload(
        &self,
        zone_id: &ZoneId,
        records: &[Record],
    ) -> Result<Vec<Record>, SyncError> {
        self.save(zone_id, records, SavePolicy::IfServerRecordUnchanged)
            .await
    }

    /// Saves `records` regardless of their stored versions
    pub async fn force_upload(
        &self,
        zone_id: &ZoneId,
        records: &[Record],
    ) -> Result<Vec<Record>, SyncError> {
        self.save(zone_id, records, SavePolicy::Overwrite).await
    }

    /// Deletes the identified records
    ///
    /// A record that does not exist fails the batch; it is not skipped.
    pub async fn remove(&self, zone_id: &ZoneId, record_ids: &[RecordId]) -> Result<(), SyncError> {
        if record_ids.is_empty() {
            return Ok(());
        }

        let operations: Vec<_> = record_ids
            .iter()
            .map(|id| RecordOperation::Delete {
                record_id: id.clone(),
            })
            .collect();

        debug!(zone = %zone_id, count = operations.len(), "Deleting records");
        let outcomes = self
            .remote
            .modify_records(zone_id, &operations)
            .await
            .map_err(batch_error)?;
        collapse(&operations, outcomes)?;

        info!(zone = %zone_id, count = record_ids.len(), "Deleted records");
        Ok(())
    }

    async fn save(
        &self,
        zone_id: &ZoneId,
        records: &[Record],
        policy: SavePolicy,
    ) -> Result<Vec<Record>, SyncError> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let operations: Vec<_> = records
            .iter()
            .map(|record| RecordOperation::Save {
                record: record.clone(),
                policy,
            })
            .collect();

        debug!(zone = %zone_id, count = operations.len(), ?policy, "Uploading records");
        let outcomes = self
            .remote
            .modify_records(zone_id, &operations)
            .await
            .map_err(batch_error)?;
        let saved = collapse(&operations, outcomes)?;

        info!(zone = %zone_id, count = saved.len(), "Uploaded records");
        Ok(saved)
    }
}

/// Maps a failure of the whole modify request
///
/// A conflict answer to a record batch is a version conflict on the records
/// it names; every other failure is a transport error.
fn batch_error(error: RemoteError) -> SyncError {
    match error {
        RemoteError::Conflict { record_ids } => SyncError::Conflict { record_ids },
        other => SyncError::Transport(other),
    }
}

/// Folds per-record outcomes into a batch result, yielding saved records
fn collapse(
    operations: &[RecordOperation],
    outcomes: Vec<RecordOutcome>,
) -> Result<Vec<Record>, SyncError> {
    if outcomes.len() != operations.len() {
        return Err(SyncError::ProtocolInvariant(format!(
            "modify batch of {} operations answered with {} results",
            operations.len(),
            outcomes.len()
        )));
    }

    let mut saved = Vec::new();
    let mut conflicts = Vec::new();
    let mut first_rejection = None;

    for outcome in outcomes {
        match outcome {
            RecordOutcome::Saved(record) => saved.push(record),
            RecordOutcome::Deleted(_) => {}
            RecordOutcome::Failed(failure) => match failure.kind {
                RecordFailureKind::Conflict => conflicts.push(failure.record_id),
                RecordFailureKind::NotFound => {
                    first_rejection.get_or_insert(RemoteError::RecordRejected {
                        record_id: failure.record_id,
                        code: NOT_FOUND_CODE.to_string(),
                        reason: "record does not exist".to_string(),
                    });
                }
                RecordFailureKind::Other { code, reason } => {
                    first_rejection.get_or_insert(RemoteError::RecordRejected {
                        record_id: failure.record_id,
                        code,
                        reason,
                    });
                }
            },
        }
    }

    if !conflicts.is_empty() {
        warn!(count = conflicts.len(), "Batch rejected for version conflicts");
        return Err(SyncError::Conflict {
            record_ids: conflicts,
        });
    }
    if let Some(rejection) = first_rejection {
        warn!(error = %rejection, "Batch rejected");
        return Err(SyncError::Transport(rejection));
    }
    Ok(saved)
}
