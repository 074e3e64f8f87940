//! Current-account identity lookup

use serde::Deserialize;
use tracing::debug;

use zonesync_core::domain::newtypes::RemoteIdentity;
use zonesync_core::ports::RemoteError;

use crate::client::RemoteClient;

/// Path of the current-user endpoint relative to the database URL
const CURRENT_USER_PATH: &str = "/users/current";

/// Response from the current-user endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CurrentUserResponse {
    user_record_name: Option<String>,
}

/// Resolves the durable identity of the authenticated account
///
/// Makes `GET /users/current`. The identity is stable for the account and is
/// meant to be cached by the caller.
pub async fn fetch_current_identity(client: &RemoteClient) -> Result<RemoteIdentity, RemoteError> {
    debug!("Fetching current user identity");

    let response: CurrentUserResponse = client.get_json(CURRENT_USER_PATH).await?;

    let name = response
        .user_record_name
        .ok_or_else(|| RemoteError::InvalidResponse("missing userRecordName".to_string()))?;

    RemoteIdentity::new(name).map_err(|e| RemoteError::InvalidResponse(e.to_string()))
}
