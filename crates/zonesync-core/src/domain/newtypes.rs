//! Domain newtypes with validation
//!
//! This module provides strongly-typed wrappers for the identifiers and opaque
//! markers exchanged with the remote record store. Each newtype ensures data
//! validity at construction time; opaque values (tokens, change tags) are only
//! checked for emptiness because their content belongs to the remote store.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;

/// Maximum length of a zone name or record name
const MAX_NAME_LEN: usize = 255;

// ============================================================================
// Account identity
// ============================================================================

/// Durable identifier of the authenticated remote account
///
/// Resolved once per install from the remote store's identity endpoint and
/// cached by the host. Used as the owner component of every [`ZoneId`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RemoteIdentity(String);

impl RemoteIdentity {
    /// Create a new RemoteIdentity
    ///
    /// # Errors
    /// Returns error if the identity is empty or contains whitespace
    pub fn new(identity: String) -> Result<Self, DomainError> {
        if identity.is_empty() {
            return Err(DomainError::InvalidIdentity(
                "Remote identity cannot be empty".to_string(),
            ));
        }
        if identity.chars().any(char::is_whitespace) {
            return Err(DomainError::InvalidIdentity(format!(
                "Remote identity cannot contain whitespace: {identity:?}"
            )));
        }
        Ok(Self(identity))
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RemoteIdentity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RemoteIdentity {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl TryFrom<String> for RemoteIdentity {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RemoteIdentity> for String {
    fn from(identity: RemoteIdentity) -> Self {
        identity.0
    }
}

// ============================================================================
// Zone types
// ============================================================================

/// Validated name of a record zone
///
/// Zone names must be non-empty, at most 255 characters, and consist of
/// ASCII letters, digits, `_` and `-`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ZoneName(String);

impl ZoneName {
    /// Create a new validated ZoneName
    ///
    /// # Errors
    /// Returns `DomainError::InvalidZoneName` if the name breaks the naming rules
    pub fn new(name: String) -> Result<Self, DomainError> {
        if name.is_empty() {
            return Err(DomainError::InvalidZoneName(
                "Zone name cannot be empty".to_string(),
            ));
        }
        if name.len() > MAX_NAME_LEN {
            return Err(DomainError::InvalidZoneName(format!(
                "Zone name exceeds {MAX_NAME_LEN} characters"
            )));
        }
        if let Some(c) = name
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
        {
            return Err(DomainError::InvalidZoneName(format!(
                "Zone name contains invalid character {c:?}: {name}"
            )));
        }
        Ok(Self(name))
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ZoneName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ZoneName {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl TryFrom<String> for ZoneName {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ZoneName> for String {
    fn from(name: ZoneName) -> Self {
        name.0
    }
}

/// Account-scoped identifier of a record zone: `(zone_name, owner)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZoneId {
    zone_name: ZoneName,
    owner: RemoteIdentity,
}

impl ZoneId {
    /// Create a ZoneId owned by the given identity
    #[must_use]
    pub fn new(zone_name: ZoneName, owner: RemoteIdentity) -> Self {
        Self { zone_name, owner }
    }

    /// The zone's name
    #[must_use]
    pub fn zone_name(&self) -> &ZoneName {
        &self.zone_name
    }

    /// The account owning the zone
    #[must_use]
    pub fn owner(&self) -> &RemoteIdentity {
        &self.owner
    }
}

impl Display for ZoneId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.zone_name, self.owner)
    }
}

/// Identifier of a change-notification subscription
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SubscriptionId(String);

impl SubscriptionId {
    /// Create a new SubscriptionId
    ///
    /// # Errors
    /// Returns error if the identifier is empty
    pub fn new(id: String) -> Result<Self, DomainError> {
        if id.trim().is_empty() {
            return Err(DomainError::InvalidSubscriptionId(
                "Subscription ID cannot be empty".to_string(),
            ));
        }
        Ok(Self(id))
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SubscriptionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for SubscriptionId {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<SubscriptionId> for String {
    fn from(id: SubscriptionId) -> Self {
        id.0
    }
}

// ============================================================================
// Record identity and versioning
// ============================================================================

/// Stable identifier of a record within a zone
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordId(String);

impl RecordId {
    /// Create a new RecordId
    ///
    /// # Errors
    /// Returns `DomainError::InvalidRecordId` if the name is empty, too long,
    /// or starts with an underscore (reserved for system records)
    pub fn new(name: String) -> Result<Self, DomainError> {
        if name.is_empty() {
            return Err(DomainError::InvalidRecordId(
                "Record ID cannot be empty".to_string(),
            ));
        }
        if name.len() > MAX_NAME_LEN {
            return Err(DomainError::InvalidRecordId(format!(
                "Record ID exceeds {MAX_NAME_LEN} characters"
            )));
        }
        if name.starts_with('_') {
            return Err(DomainError::InvalidRecordId(format!(
                "Record ID cannot start with '_': {name}"
            )));
        }
        Ok(Self(name))
    }

    /// Generate a fresh random RecordId for a record that has never been saved
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl TryFrom<String> for RecordId {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

/// Remote-assigned version marker (change tag) of a record
///
/// Opaque to the client. Every write carries the marker last observed for
/// the record so the remote store can reject writes against stale state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordVersion(String);

impl RecordVersion {
    /// Create a new RecordVersion
    ///
    /// # Errors
    /// Returns error if the marker is empty
    pub fn new(tag: String) -> Result<Self, DomainError> {
        if tag.is_empty() {
            return Err(DomainError::InvalidRecordVersion(
                "Record version cannot be empty".to_string(),
            ));
        }
        Ok(Self(tag))
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RecordVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for RecordVersion {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RecordVersion> for String {
    fn from(version: RecordVersion) -> Self {
        version.0
    }
}

// ============================================================================
// Change token
// ============================================================================

/// Opaque cursor over a zone's change history
///
/// Issued by the remote store at the end of every successful change fetch.
/// Absence of a token means "fetch the full history". The engine never
/// persists tokens; the host stores the last one it applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChangeToken(String);

impl ChangeToken {
    /// Create a new ChangeToken
    ///
    /// # Errors
    /// Returns error if the token is empty
    pub fn new(token: String) -> Result<Self, DomainError> {
        if token.is_empty() {
            return Err(DomainError::InvalidChangeToken(
                "Change token cannot be empty".to_string(),
            ));
        }

        // Tokens are opaque and may carry base64 or URL-encoded content
        Ok(Self(token))
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ChangeToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ChangeToken {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl TryFrom<String> for ChangeToken {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ChangeToken> for String {
    fn from(token: ChangeToken) -> Self {
        token.0
    }
}
