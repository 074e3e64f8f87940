//! Identity store port (driven/secondary port)
//!
//! Persists the resolved [`RemoteIdentity`] under a fixed well-known key so
//! that identity resolution costs one network call per install rather than
//! one per start. The host chooses the backing persistence.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because persistence errors are adapter-specific
//!   (keyring, file, memory) and don't need domain-level classification.
//! - Methods are synchronous: every shipped backend is a local, bounded
//!   operation and the identity is read once per start.

use crate::domain::newtypes::RemoteIdentity;

/// Well-known key under which the identity is persisted
pub const IDENTITY_KEY: &str = "remote-identity";

/// Port trait for persisting the resolved remote identity
///
/// Lifecycle: written once on first successful resolution, read thereafter,
/// cleared only when the host wants the next start to re-resolve.
pub trait IIdentityStore: Send + Sync {
    /// Loads the cached identity, `None` if nothing has been stored yet
    fn load(&self) -> anyhow::Result<Option<RemoteIdentity>>;

    /// Persists the identity
    fn store(&self, identity: &RemoteIdentity) -> anyhow::Result<()>;

    /// Removes the cached identity; clearing an empty store is not an error
    fn clear(&self) -> anyhow::Result<()>;
}
