//! Port definitions (hexagonal architecture interfaces)
//!
//! Ports are the interfaces the engine depends on; their implementations
//! live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IRemoteStore`] - Remote record store operations (identity, zones, subscriptions, changes, records)
//! - [`IIdentityStore`] - Persistence for the resolved remote identity

pub mod identity_store;
pub mod remote_store;

pub use identity_store::{IIdentityStore, IDENTITY_KEY};
pub use remote_store::{
    ChangePage, IRemoteStore, RecordFailure, RecordFailureKind, RecordOperation, RecordOutcome,
    RemoteError, SavePolicy, ZoneSubscription,
};
