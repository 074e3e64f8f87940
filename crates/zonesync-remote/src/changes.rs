//! Zone change feed for incremental synchronization
//!
//! Implements one page of the zone change query. Following pages and
//! accumulating them into a single result is the engine's job: the adapter
//! returns each page exactly as the remote delivered it.
//!
//! ## Change Feed Flow
//!
//! 1. **Initial fetch**: call [`fetch_zone_changes`] with `since = None`
//! 2. **Follow pages**: while `more_coming` is true, call again with the
//!    page's `change_token`
//! 3. **Save token**: the token of the last page is the one to persist
//! 4. **Incremental fetch**: pass the saved token to receive only newer changes

use serde::{Deserialize, Serialize};
use tracing::debug;

use zonesync_core::domain::newtypes::{ChangeToken, ZoneId};
use zonesync_core::ports::{ChangePage, RemoteError};

use crate::client::RemoteClient;
use crate::wire::{map_server_error_code, WireRecord, WireZoneId};

/// Path of the zone changes endpoint relative to the database URL
const CHANGES_PATH: &str = "/changes/zone";

// ============================================================================
// Request / response bodies
// ============================================================================

#[derive(Debug, Serialize)]
struct ChangesRequest {
    zones: Vec<ZoneChangesQuery>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ZoneChangesQuery {
    #[serde(rename = "zoneID")]
    zone_id: WireZoneId,
    #[serde(skip_serializing_if = "Option::is_none")]
    sync_token: Option<String>,
    results_limit: u32,
}

#[derive(Debug, Deserialize)]
struct ChangesResponse {
    #[serde(default)]
    zones: Vec<ZoneChanges>,
}

/// Changes for one zone, or the error that prevented reading them
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ZoneChanges {
    sync_token: Option<String>,
    #[serde(default)]
    more_coming: bool,
    #[serde(default)]
    records: Vec<WireRecord>,
    server_error_code: Option<String>,
    reason: Option<String>,
}

// ============================================================================
// Page parsing
// ============================================================================

/// Converts a raw zone entry into a port-level [`ChangePage`]
///
/// Records flagged `deleted` become deletions; everything else is a change.
/// Delivery order is preserved within each list.
fn parse_page(zone: ZoneChanges) -> Result<ChangePage, RemoteError> {
    if let Some(code) = zone.server_error_code {
        return Err(map_server_error_code(&code, zone.reason.unwrap_or_default()));
    }

    let mut page = ChangePage {
        more_coming: zone.more_coming,
        ..ChangePage::default()
    };

    for record in zone.records {
        if record.deleted {
            page.deleted.push(record.record_id()?);
        } else {
            page.changed.push(record.into_record()?);
        }
    }

    page.change_token = zone
        .sync_token
        .map(ChangeToken::new)
        .transpose()
        .map_err(|e| RemoteError::InvalidResponse(e.to_string()))?;

    Ok(page)
}

/// Fetches one page of changes for `zone_id` after `since`
///
/// # Arguments
///
/// * `client` - Authenticated [`RemoteClient`]
/// * `zone_id` - Zone to read
/// * `since` - Token from a previous page or fetch; `None` reads from the beginning
/// * `results_limit` - Maximum number of changes in the page
///
/// # Errors
///
/// Returns [`RemoteError::ChangeTokenExpired`] when the remote no longer
/// accepts `since`, [`RemoteError::ZoneNotFound`] when the zone is gone, and
/// the usual transport errors otherwise.
pub async fn fetch_zone_changes(
    client: &RemoteClient,
    zone_id: &ZoneId,
    since: Option<&ChangeToken>,
    results_limit: u32,
) -> Result<ChangePage, RemoteError> {
    debug!(
        zone = %zone_id,
        has_token = since.is_some(),
        results_limit,
        "Requesting zone changes page"
    );

    let request = ChangesRequest {
        zones: vec![ZoneChangesQuery {
            zone_id: WireZoneId::from(zone_id),
            sync_token: since.map(|t| t.as_str().to_string()),
            results_limit,
        }],
    };

    let response: ChangesResponse = client.post_json(CHANGES_PATH, &request).await?;

    let zone = response
        .zones
        .into_iter()
        .next()
        .ok_or_else(|| RemoteError::InvalidResponse("changes response has no zones".into()))?;

    let page = parse_page(zone)?;

    debug!(
        changed = page.changed.len(),
        deleted = page.deleted.len(),
        more_coming = page.more_coming,
        has_token = page.change_token.is_some(),
        "Received zone changes page"
    );

    Ok(page)
}
