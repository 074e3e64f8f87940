//! Record save and delete operations
//!
//! A batch is sent as one non-atomic `records/modify` request. The remote
//! answers with one result per operation, in request order; each result is
//! either the stored record (with its new change tag) or a per-record error.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use zonesync_core::domain::newtypes::ZoneId;
use zonesync_core::ports::{
    RecordFailure, RecordOperation, RecordOutcome, RemoteError, SavePolicy,
};

use crate::client::RemoteClient;
use crate::wire::{record_failure_kind, WireRecord, WireZoneId};

/// Path of the records modify endpoint relative to the database URL
const RECORDS_MODIFY_PATH: &str = "/records/modify";

// ============================================================================
// Request / response bodies
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ModifyRecordsRequest {
    #[serde(rename = "zoneID")]
    zone_id: WireZoneId,
    atomic: bool,
    operations: Vec<WireOperation>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireOperation {
    operation_type: &'static str,
    record: WireRecord,
}

#[derive(Debug, Deserialize)]
struct ModifyRecordsResponse {
    #[serde(default)]
    records: Vec<WireRecord>,
}

/// Chooses the remote operation type for a port-level operation
///
/// Saves of records that have never been stored are creates; saves carrying
/// a version marker are conditional updates unless the caller asked to
/// overwrite.
fn operation_type(operation: &RecordOperation) -> &'static str {
    match operation {
        RecordOperation::Save {
            policy: SavePolicy::Overwrite,
            ..
        } => "forceUpdate",
        RecordOperation::Save { record, .. } if record.is_new() => "create",
        RecordOperation::Save { .. } => "update",
        RecordOperation::Delete { .. } => "delete",
    }
}

fn to_wire(operation: &RecordOperation) -> WireOperation {
    let record = match operation {
        RecordOperation::Save { record, .. } => WireRecord::from_record(record),
        RecordOperation::Delete { record_id } => WireRecord::reference(record_id),
    };
    WireOperation {
        operation_type: operation_type(operation),
        record,
    }
}

/// Pairs each operation with its result
fn parse_outcome(
    operation: &RecordOperation,
    result: WireRecord,
) -> Result<RecordOutcome, RemoteError> {
    let record_id = operation.record_id();
    if result.record_name != record_id.as_str() {
        return Err(RemoteError::InvalidResponse(format!(
            "result for {} returned where {} was expected",
            result.record_name, record_id
        )));
    }

    if let Some(code) = result.server_error_code {
        let kind = record_failure_kind(&code, result.reason.unwrap_or_default());
        warn!(record = %record_id, code = %code, "Record operation rejected");
        return Ok(RecordOutcome::Failed(RecordFailure {
            record_id: record_id.clone(),
            kind,
        }));
    }

    match operation {
        RecordOperation::Save { .. } => Ok(RecordOutcome::Saved(result.into_record()?)),
        RecordOperation::Delete { record_id } => Ok(RecordOutcome::Deleted(record_id.clone())),
    }
}

/// Applies a batch of saves and deletes to the zone
///
/// # Returns
///
/// One [`RecordOutcome`] per operation, in the order given.
///
/// # Errors
///
/// Transport failures and malformed responses fail the whole call.
/// Per-record rejections are reported as [`RecordOutcome::Failed`].
pub async fn modify_records(
    client: &RemoteClient,
    zone_id: &ZoneId,
    operations: &[RecordOperation],
) -> Result<Vec<RecordOutcome>, RemoteError> {
    if operations.is_empty() {
        return Ok(Vec::new());
    }

    debug!(zone = %zone_id, operations = operations.len(), "Modifying records");

    let request = ModifyRecordsRequest {
        zone_id: WireZoneId::from(zone_id),
        atomic: false,
        operations: operations.iter().map(to_wire).collect(),
    };

    let response: ModifyRecordsResponse = client.post_json(RECORDS_MODIFY_PATH, &request).await?;

    if response.records.len() != operations.len() {
        return Err(RemoteError::InvalidResponse(format!(
            "expected {} record results, got {}",
            operations.len(),
            response.records.len()
        )));
    }

    let outcomes = operations
        .iter()
        .zip(response.records)
        .map(|(operation, result)| parse_outcome(operation, result))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(
        zone = %zone_id,
        failed = outcomes
            .iter()
            .filter(|o| matches!(o, RecordOutcome::Failed(_)))
            .count(),
        "Records modified"
    );

    Ok(outcomes)
}
