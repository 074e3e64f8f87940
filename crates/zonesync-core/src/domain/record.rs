//! Record entity
//!
//! A [`Record`] is a versioned key-value entity stored in the sync zone. The
//! remote store is authoritative; the host keeps a cached copy plus pending
//! edits and hands dirty records back to the engine for upload.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::DomainError;
use super::newtypes::{RecordId, RecordVersion};

/// A versioned key-value record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    id: RecordId,
    record_type: String,
    /// Last version observed from the remote store; `None` until first saved
    version: Option<RecordVersion>,
    fields: BTreeMap<String, Value>,
    modified_at: Option<DateTime<Utc>>,
}

impl Record {
    /// Create an unsaved record of the given type
    ///
    /// # Errors
    /// Returns `DomainError::InvalidRecordType` if `record_type` is empty or
    /// contains characters other than ASCII letters, digits and `_`
    pub fn new(id: RecordId, record_type: impl Into<String>) -> Result<Self, DomainError> {
        let record_type = record_type.into();
        if record_type.is_empty()
            || !record_type
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(DomainError::InvalidRecordType(record_type));
        }

        Ok(Self {
            id,
            record_type,
            version: None,
            fields: BTreeMap::new(),
            modified_at: None,
        })
    }

    /// Builder-style field setter
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Builder-style version setter
    #[must_use]
    pub fn with_version(mut self, version: RecordVersion) -> Self {
        self.version = Some(version);
        self
    }

    /// Builder-style modification timestamp setter
    #[must_use]
    pub fn with_modified_at(mut self, modified_at: DateTime<Utc>) -> Self {
        self.modified_at = Some(modified_at);
        self
    }

    pub fn id(&self) -> &RecordId {
        &self.id
    }

    pub fn record_type(&self) -> &str {
        &self.record_type
    }

    pub fn version(&self) -> Option<&RecordVersion> {
        self.version.as_ref()
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn modified_at(&self) -> Option<DateTime<Utc>> {
        self.modified_at
    }

    /// Returns true if the record has never been acknowledged by the remote store
    pub fn is_new(&self) -> bool {
        self.version.is_none()
    }

    /// Sets or replaces a field value, returning the previous value
    pub fn set_field(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(name.into(), value)
    }

    /// Removes a field, returning its value if it was present
    pub fn remove_field(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    /// Records the version the remote store assigned after a save or fetch
    pub fn set_version(&mut self, version: RecordVersion) {
        self.version = Some(version);
    }
}
