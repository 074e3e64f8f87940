//! Change collection produced by an incremental fetch
//!
//! A [`ChangeCollection`] is the immutable hand-off between the engine and the
//! host's local store: upsert every changed record by identifier, delete every
//! listed identifier, then persist the new token for the next fetch.

use super::newtypes::{ChangeToken, RecordId};
use super::record::Record;

/// Immutable bundle of remote changes since a given change token
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeCollection {
    changed_records: Vec<Record>,
    deleted_record_ids: Vec<RecordId>,
    new_change_token: ChangeToken,
}

impl ChangeCollection {
    /// Assemble a collection. Sequences keep remote delivery order.
    pub fn new(
        changed_records: Vec<Record>,
        deleted_record_ids: Vec<RecordId>,
        new_change_token: ChangeToken,
    ) -> Self {
        Self {
            changed_records,
            deleted_record_ids,
            new_change_token,
        }
    }

    pub fn changed_records(&self) -> &[Record] {
        &self.changed_records
    }

    pub fn deleted_record_ids(&self) -> &[RecordId] {
        &self.deleted_record_ids
    }

    pub fn new_change_token(&self) -> &ChangeToken {
        &self.new_change_token
    }

    /// True when no record changed or was deleted. The token may still have advanced.
    pub fn is_empty(&self) -> bool {
        self.changed_records.is_empty() && self.deleted_record_ids.is_empty()
    }

    /// Total number of changes (upserts plus deletions)
    pub fn len(&self) -> usize {
        self.changed_records.len() + self.deleted_record_ids.len()
    }

    /// Consume the collection, yielding its parts for the apply step
    pub fn into_parts(self) -> (Vec<Record>, Vec<RecordId>, ChangeToken) {
        (
            self.changed_records,
            self.deleted_record_ids,
            self.new_change_token,
        )
    }
}
