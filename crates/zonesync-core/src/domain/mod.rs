//! Domain entities and business logic
//!
//! This module contains the core domain types for ZoneSync:
//! - Newtypes for identities, zone/record identifiers and opaque remote markers
//! - The versioned [`Record`] entity
//! - The [`ChangeCollection`] produced by incremental fetches
//! - Domain-specific error types

pub mod changes;
pub mod errors;
pub mod newtypes;
pub mod record;

// Re-export commonly used types
pub use changes::ChangeCollection;
pub use errors::DomainError;
pub use newtypes::*;
pub use record::Record;
