//! ZoneSync Core - Domain types and ports
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain types** - `Record`, `ChangeCollection`, and validated identifiers
//!   (`RemoteIdentity`, `ZoneId`, `RecordId`, `RecordVersion`, `ChangeToken`)
//! - **Port definitions** - `IRemoteStore` for the remote record store and
//!   `IIdentityStore` for the cached account identity
//! - **Configuration** - YAML-backed settings shared by the adapter and engine
//!
//! # Architecture
//!
//! The domain module contains pure data types with no I/O. Ports define the
//! trait interfaces that adapter crates implement; the sync engine depends
//! only on these traits.

pub mod config;
pub mod domain;
pub mod ports;
