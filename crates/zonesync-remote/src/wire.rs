//! JSON wire types shared by the zone, change and record endpoints
//!
//! These structs mirror the remote service's JSON shapes and never leave the
//! crate; everything crossing the port boundary is converted into
//! `zonesync-core` types first.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use zonesync_core::domain::newtypes::{RecordId, RecordVersion, ZoneId};
use zonesync_core::domain::record::Record;
use zonesync_core::ports::{RecordFailureKind, RemoteError};

// ============================================================================
// Server error codes
// ============================================================================

pub(crate) const CODE_CONFLICT: &str = "CONFLICT";
pub(crate) const CODE_NOT_FOUND: &str = "NOT_FOUND";
pub(crate) const CODE_ZONE_NOT_FOUND: &str = "ZONE_NOT_FOUND";
pub(crate) const CODE_CHANGE_TOKEN_EXPIRED: &str = "CHANGE_TOKEN_EXPIRED";
pub(crate) const CODE_ZONE_ALREADY_EXISTS: &str = "ZONE_ALREADY_EXISTS";
pub(crate) const CODE_QUOTA_EXCEEDED: &str = "QUOTA_EXCEEDED";
pub(crate) const CODE_THROTTLED: &str = "THROTTLED";
pub(crate) const CODE_AUTHENTICATION_FAILED: &str = "AUTHENTICATION_FAILED";
pub(crate) const CODE_ACCESS_DENIED: &str = "ACCESS_DENIED";
pub(crate) const CODE_INTERNAL_ERROR: &str = "INTERNAL_ERROR";

/// Fallback wait for `THROTTLED` codes that arrive without a header
const THROTTLED_RETRY_AFTER: std::time::Duration = std::time::Duration::from_secs(30);

/// Maps a `serverErrorCode` reported for a whole request or zone onto [`RemoteError`]
pub(crate) fn map_server_error_code(code: &str, reason: String) -> RemoteError {
    match code {
        CODE_CONFLICT => RemoteError::Conflict { record_ids: vec![] },
        CODE_NOT_FOUND => RemoteError::NotFound(reason),
        CODE_ZONE_NOT_FOUND => RemoteError::ZoneNotFound(reason),
        CODE_CHANGE_TOKEN_EXPIRED => RemoteError::ChangeTokenExpired,
        CODE_ZONE_ALREADY_EXISTS => RemoteError::AlreadyExists(reason),
        CODE_QUOTA_EXCEEDED => RemoteError::QuotaExceeded(reason),
        CODE_THROTTLED => RemoteError::TooManyRequests {
            retry_after: THROTTLED_RETRY_AFTER,
        },
        CODE_AUTHENTICATION_FAILED => RemoteError::Unauthorized(reason),
        CODE_ACCESS_DENIED => RemoteError::Forbidden(reason),
        CODE_INTERNAL_ERROR => RemoteError::ServerError(reason),
        other => RemoteError::InvalidResponse(format!("{other}: {reason}")),
    }
}

/// Maps a `serverErrorCode` reported for a single record onto a failure kind
pub(crate) fn record_failure_kind(code: &str, reason: String) -> RecordFailureKind {
    match code {
        CODE_CONFLICT => RecordFailureKind::Conflict,
        CODE_NOT_FOUND => RecordFailureKind::NotFound,
        other => RecordFailureKind::Other {
            code: other.to_string(),
            reason,
        },
    }
}

// ============================================================================
// Zone identifier
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireZoneId {
    pub zone_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_record_name: Option<String>,
}

impl From<&ZoneId> for WireZoneId {
    fn from(zone_id: &ZoneId) -> Self {
        Self {
            zone_name: zone_id.zone_name().as_str().to_string(),
            owner_record_name: Some(zone_id.owner().as_str().to_string()),
        }
    }
}

// ============================================================================
// Records
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct WireField {
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct WireTimestamp {
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

/// A record as sent and received on the wire
///
/// Results of record operations reuse this shape: failures carry
/// `serverErrorCode`/`reason`, deletions in the change feed carry `deleted`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireRecord {
    pub record_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_change_tag: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, WireField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<WireTimestamp>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deleted: bool,
    #[serde(default, skip_serializing)]
    pub server_error_code: Option<String>,
    #[serde(default, skip_serializing)]
    pub reason: Option<String>,
}

impl WireRecord {
    /// Wire form of a domain record, including its version marker if it has one
    pub fn from_record(record: &Record) -> Self {
        Self {
            record_name: record.id().as_str().to_string(),
            record_type: Some(record.record_type().to_string()),
            record_change_tag: record.version().map(|v| v.as_str().to_string()),
            fields: record
                .fields()
                .iter()
                .map(|(name, value)| {
                    (
                        name.clone(),
                        WireField {
                            value: value.clone(),
                        },
                    )
                })
                .collect(),
            modified: None,
            ..Self::default()
        }
    }

    /// Wire form used for delete operations: only the name is sent
    pub fn reference(record_id: &RecordId) -> Self {
        Self {
            record_name: record_id.as_str().to_string(),
            ..Self::default()
        }
    }

    /// Validated record identifier
    pub fn record_id(&self) -> Result<RecordId, RemoteError> {
        RecordId::new(self.record_name.clone())
            .map_err(|e| RemoteError::InvalidResponse(e.to_string()))
    }

    /// Converts a received record into the domain type
    pub fn into_record(self) -> Result<Record, RemoteError> {
        let id = self.record_id()?;
        let record_type = self.record_type.ok_or_else(|| {
            RemoteError::InvalidResponse(format!("record {id} has no recordType"))
        })?;

        let mut record = Record::new(id, record_type)
            .map_err(|e| RemoteError::InvalidResponse(e.to_string()))?;

        if let Some(tag) = self.record_change_tag {
            let version =
                RecordVersion::new(tag).map_err(|e| RemoteError::InvalidResponse(e.to_string()))?;
            record = record.with_version(version);
        }

        if let Some(modified) = self.modified {
            let at: DateTime<Utc> = DateTime::from_timestamp_millis(modified.timestamp)
                .ok_or_else(|| {
                    RemoteError::InvalidResponse(format!(
                        "timestamp out of range: {}",
                        modified.timestamp
                    ))
                })?;
            record = record.with_modified_at(at);
        }

        for (name, field) in self.fields {
            record = record.with_field(name, field.value);
        }

        Ok(record)
    }
}
