//! Remote record store port (driven/secondary port)
//!
//! This module defines the interface to the remote, multi-device record
//! store. Each trait method corresponds to exactly one network operation;
//! ordering between operations, accumulation across pages and error
//! classification for callers are the engine's job, not the adapter's.
//!
//! ## Design Notes
//!
//! - Unlike the host-persistence ports, this port returns a classified
//!   [`RemoteError`]: the engine must tell conflicts, expired change tokens and
//!   idempotent "already exists" answers apart from plain transport failures.
//! - Adapters never retry. Timeouts belong to the transport beneath the
//!   adapter (for HTTP, the client's request timeout).
//! - Uses `#[async_trait]` for async trait methods.

use std::time::Duration;

use thiserror::Error;

use crate::domain::newtypes::{ChangeToken, RecordId, RemoteIdentity, SubscriptionId, ZoneId};
use crate::domain::record::Record;

// ============================================================================
// RemoteError
// ============================================================================

/// Errors reported by a remote store adapter
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// Authentication credentials are missing, invalid or expired
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The account may not perform the requested operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The target zone does not exist (never created, or deleted by another device)
    #[error("Zone not found: {0}")]
    ZoneNotFound(String),

    /// The resource being created already exists
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Optimistic-concurrency rejection: the stored version has advanced
    #[error("Conflict on {} record(s)", record_ids.len())]
    Conflict {
        /// Records whose stored version no longer matches the submitted marker
        record_ids: Vec<RecordId>,
    },

    /// The change token is too old or the zone was reset; a full fetch is required
    #[error("Change token expired")]
    ChangeTokenExpired,

    /// The account's storage quota is exhausted
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Rate limit exceeded; retry after the specified duration
    #[error("Too many requests, retry after {retry_after:?}")]
    TooManyRequests {
        /// Duration to wait before retrying
        retry_after: Duration,
    },

    /// A server-side error occurred (5xx or internal error code)
    #[error("Server error: {0}")]
    ServerError(String),

    /// A network-level error occurred (connect, timeout, TLS)
    #[error("Network error: {0}")]
    Network(String),

    /// The response could not be parsed or was malformed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// A single record in a batch was rejected for a reason other than a conflict
    #[error("Record {record_id} rejected ({code}): {reason}")]
    RecordRejected {
        /// The rejected record
        record_id: RecordId,
        /// Remote error code, e.g. `NOT_FOUND`
        code: String,
        /// Human-readable reason from the remote store
        reason: String,
    },
}

impl RemoteError {
    /// Returns true for failures a caller may reasonably retry unchanged
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            RemoteError::TooManyRequests { .. }
                | RemoteError::ServerError(_)
                | RemoteError::Network(_)
        )
    }
}

// ============================================================================
// Subscription
// ============================================================================

/// A zone-scoped change-notification registration
///
/// Notifications carry no payload: they are a "content changed" signal that
/// the host answers with a fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneSubscription {
    /// Stable identifier; saving the same id again replaces the registration
    pub subscription_id: SubscriptionId,
    /// Zone whose record changes trigger notifications
    pub zone_id: ZoneId,
    /// Request silent (content-available only) notifications
    pub silent: bool,
}

impl ZoneSubscription {
    /// Create a silent subscription for the given zone
    pub fn silent(subscription_id: SubscriptionId, zone_id: ZoneId) -> Self {
        Self {
            subscription_id,
            zone_id,
            silent: true,
        }
    }
}

// ============================================================================
// Change feed
// ============================================================================

/// One page of a zone's change feed
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChangePage {
    /// Records created or modified, in delivery order
    pub changed: Vec<Record>,
    /// Identifiers of records deleted, in delivery order
    pub deleted: Vec<RecordId>,
    /// Token positioned after this page (intermediate unless `more_coming` is false)
    pub change_token: Option<ChangeToken>,
    /// True when further pages follow
    pub more_coming: bool,
}

// ============================================================================
// Record mutations
// ============================================================================

/// How a save treats the version marker carried by the record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavePolicy {
    /// Reject the save if the stored version differs from the record's marker
    IfServerRecordUnchanged,
    /// Replace the stored record regardless of its version
    Overwrite,
}

/// A single operation within a record-modify batch
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOperation {
    /// Create or update a record
    Save {
        /// Record to save, carrying its last observed version
        record: Record,
        /// Concurrency policy for this save
        policy: SavePolicy,
    },
    /// Delete a record by identifier
    Delete {
        /// Record to delete
        record_id: RecordId,
    },
}

impl RecordOperation {
    /// Identifier of the record this operation targets
    pub fn record_id(&self) -> &RecordId {
        match self {
            RecordOperation::Save { record, .. } => record.id(),
            RecordOperation::Delete { record_id } => record_id,
        }
    }
}

/// Why a single record in a batch failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordFailureKind {
    /// The stored version advanced past the submitted marker
    Conflict,
    /// The record does not exist
    NotFound,
    /// Any other remote rejection
    Other {
        /// Remote error code
        code: String,
        /// Human-readable reason
        reason: String,
    },
}

/// A per-record failure reported inside an otherwise delivered batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFailure {
    pub record_id: RecordId,
    pub kind: RecordFailureKind,
}

/// Result of one operation in a record-modify batch
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    /// Record saved; carries the server-assigned version
    Saved(Record),
    /// Record deleted
    Deleted(RecordId),
    /// Record rejected
    Failed(RecordFailure),
}

// ============================================================================
// IRemoteStore trait
// ============================================================================

/// Port trait for remote record store operations
///
/// Every method issues one network operation and returns when the transport
/// acknowledges it. Implementations must be safe to share across tasks.
#[async_trait::async_trait]
pub trait IRemoteStore: Send + Sync {
    /// Resolves the durable identity of the authenticated account
    async fn fetch_current_identity(&self) -> Result<RemoteIdentity, RemoteError>;

    /// Creates the zone. Creating an existing zone is not an error; adapters
    /// return `Ok(())` or [`RemoteError::AlreadyExists`] for it.
    async fn save_zone(&self, zone_id: &ZoneId) -> Result<(), RemoteError>;

    /// Creates or replaces a zone subscription
    async fn save_subscription(&self, subscription: &ZoneSubscription) -> Result<(), RemoteError>;

    /// Fetches one page of changes after `since` (`None` = from the beginning)
    ///
    /// # Arguments
    /// * `zone_id` - Zone to read
    /// * `since` - Token from a previous page or fetch
    /// * `results_limit` - Maximum number of changes the page may carry
    async fn fetch_zone_changes(
        &self,
        zone_id: &ZoneId,
        since: Option<&ChangeToken>,
        results_limit: u32,
    ) -> Result<ChangePage, RemoteError>;

    /// Applies a batch of saves and deletes, reporting one outcome per operation
    ///
    /// A transport-level failure fails the whole call; per-record rejections
    /// are returned as [`RecordOutcome::Failed`].
    async fn modify_records(
        &self,
        zone_id: &ZoneId,
        operations: &[RecordOperation],
    ) -> Result<Vec<RecordOutcome>, RemoteError>;
}
