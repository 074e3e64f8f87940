//! ZoneSync Remote - HTTP client for the remote record store
//!
//! Provides async access to:
//! - The signed-in account's durable identity
//! - Zone creation and silent zone subscriptions
//! - The paginated zone change feed
//! - Batched, version-checked record saves and deletes
//!
//! ## Modules
//!
//! - [`client`] - Authenticated HTTP client and error mapping
//! - [`identity`] - Current-account identity lookup
//! - [`zones`] - Zone and subscription registration
//! - [`changes`] - One page of the zone change feed
//! - [`records`] - Record save/delete batches
//! - [`provider`] - [`HttpRemoteStore`], the `IRemoteStore` adapter
//! - [`keyring_store`] - Keyring-backed `IIdentityStore`

pub mod changes;
pub mod client;
pub mod identity;
pub mod keyring_store;
pub mod provider;
pub mod records;
pub mod zones;

mod wire;

pub use client::RemoteClient;
pub use keyring_store::KeyringIdentityStore;
pub use provider::HttpRemoteStore;
