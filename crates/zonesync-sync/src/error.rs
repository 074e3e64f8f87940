//! Engine error taxonomy
//!
//! Every engine operation returns [`SyncError`]. Remote failures are carried
//! unmodified inside [`SyncError::Transport`]. Optimistic-concurrency
//! rejections of an upload get their own variant so callers can re-fetch and
//! re-apply instead of blindly retrying; only the mutation path produces it.
//! A conflict answer to any other request stays a transport failure.

use thiserror::Error;

use zonesync_core::domain::newtypes::RecordId;
use zonesync_core::ports::RemoteError;

/// Errors that can occur during synchronization operations
#[derive(Debug, Error)]
pub enum SyncError {
    /// The remote store or the network failed; recoverable by caller-driven retry
    #[error("Transport error: {0}")]
    Transport(RemoteError),

    /// One or more records were rejected because their stored version advanced
    #[error("Write conflict on {} record(s)", record_ids.len())]
    Conflict {
        /// Every record in the batch that was rejected for a stale version
        record_ids: Vec<RecordId>,
    },

    /// The remote broke a contract the engine relies on (e.g. no final token)
    #[error("Protocol invariant violated: {0}")]
    ProtocolInvariant(String),

    /// An operation was invoked before `initialise` completed successfully
    #[error("Sync client is not initialised")]
    NotInitialised,

    /// The host's identity persistence failed
    #[error("Identity store error: {0:#}")]
    IdentityStore(#[source] anyhow::Error),
}

impl From<RemoteError> for SyncError {
    fn from(error: RemoteError) -> Self {
        SyncError::Transport(error)
    }
}

impl SyncError {
    /// Returns true when retrying the same call unchanged may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Transport(e) => e.is_transient(),
            _ => false,
        }
    }

    /// Returns true for internal contract breaches that retrying cannot fix
    pub fn is_fatal(&self) -> bool {
        matches!(self, SyncError::ProtocolInvariant(_))
    }

    /// Returns true when the caller must discard its token and fetch from scratch
    pub fn requires_full_resync(&self) -> bool {
        matches!(
            self,
            SyncError::Transport(RemoteError::ChangeTokenExpired)
                | SyncError::Transport(RemoteError::ZoneNotFound(_))
        )
    }

    /// The underlying remote error, if this is a transport failure
    pub fn remote(&self) -> Option<&RemoteError> {
        match self {
            SyncError::Transport(e) => Some(e),
            _ => None,
        }
    }
}
