//! Domain error types
//!
//! Validation failures raised when constructing domain newtypes and records.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Remote identity is empty or malformed
    #[error("Invalid remote identity: {0}")]
    InvalidIdentity(String),

    /// Zone name violates naming rules
    #[error("Invalid zone name: {0}")]
    InvalidZoneName(String),

    /// Subscription identifier is empty or malformed
    #[error("Invalid subscription ID: {0}")]
    InvalidSubscriptionId(String),

    /// Record identifier is empty or malformed
    #[error("Invalid record ID: {0}")]
    InvalidRecordId(String),

    /// Record version marker is empty
    #[error("Invalid record version: {0}")]
    InvalidRecordVersion(String),

    /// Change token is empty
    #[error("Invalid change token: {0}")]
    InvalidChangeToken(String),

    /// Record type is empty or malformed
    #[error("Invalid record type: {0}")]
    InvalidRecordType(String),
}
