//! Integration tests for zonesync-remote
//!
//! Uses wiremock to simulate the remote database web service and verifies
//! end-to-end behavior of the HTTP adapter: identity lookup, zone and
//! subscription registration, the change feed, record batches and the
//! mapping of HTTP failures.

mod common;

mod test_changes;
mod test_errors;
mod test_identity;
mod test_records;
mod test_zones;
