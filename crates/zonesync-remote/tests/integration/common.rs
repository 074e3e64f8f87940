//! Shared test helpers for remote store integration tests
//!
//! Provides wiremock-based mock server setup. Each helper mounts the endpoints
//! a test needs and returns an adapter pointing at the mock server.

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use zonesync_core::domain::newtypes::{RemoteIdentity, ZoneId, ZoneName};
use zonesync_remote::{HttpRemoteStore, RemoteClient};

/// Database prefix the mock server answers under
pub const DB: &str = "/database/1/iCloud.org.example.books/development/private";

/// Token every request is expected to carry
pub const TOKEN: &str = "test-api-token";

/// Full mock path for an endpoint
pub fn db_path(endpoint: &str) -> String {
    format!("{DB}{endpoint}")
}

/// Starts a mock server and returns it with an adapter pointing at it
pub async fn setup_remote_mock() -> (MockServer, HttpRemoteStore) {
    let server = MockServer::start().await;
    let client = RemoteClient::with_base_url(TOKEN, format!("{}{}", server.uri(), DB));
    (server, HttpRemoteStore::new(client))
}

/// The zone used throughout the tests
pub fn zone() -> ZoneId {
    ZoneId::new(
        ZoneName::new("SyncZone".to_string()).unwrap(),
        RemoteIdentity::new("_owner".to_string()).unwrap(),
    )
}

/// Mounts a POST endpoint answering with the given status and JSON body
pub async fn mount_post(server: &MockServer, endpoint: &str, status: u16, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path(db_path(endpoint)))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}
