//! Zone creation and zone subscription registration
//!
//! Both endpoints take a list of operations; the adapter always sends exactly
//! one and reads the single result back.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use zonesync_core::domain::newtypes::ZoneId;
use zonesync_core::ports::{RemoteError, ZoneSubscription};

use crate::client::RemoteClient;
use crate::wire::{map_server_error_code, WireZoneId};

const ZONES_MODIFY_PATH: &str = "/zones/modify";
const SUBSCRIPTIONS_MODIFY_PATH: &str = "/subscriptions/modify";

// ============================================================================
// Request / response bodies
// ============================================================================

#[derive(Debug, Serialize)]
struct ModifyRequest<T> {
    operations: Vec<T>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ZoneOperation {
    operation_type: &'static str,
    zone: ZoneBody,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ZoneBody {
    #[serde(rename = "zoneID")]
    zone_id: WireZoneId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubscriptionOperation {
    operation_type: &'static str,
    subscription: SubscriptionBody,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubscriptionBody {
    #[serde(rename = "subscriptionID")]
    subscription_id: String,
    subscription_type: &'static str,
    #[serde(rename = "zoneID")]
    zone_id: WireZoneId,
    notification_info: NotificationInfo,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NotificationInfo {
    should_send_content_available: bool,
}

/// One entry of a modify response: either the saved object or an error
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModifyResult {
    server_error_code: Option<String>,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ZonesResponse {
    #[serde(default)]
    zones: Vec<ModifyResult>,
}

#[derive(Debug, Deserialize)]
struct SubscriptionsResponse {
    #[serde(default)]
    subscriptions: Vec<ModifyResult>,
}

/// Checks the single result of a one-operation modify request
fn single_result(results: Vec<ModifyResult>, what: &str) -> Result<(), RemoteError> {
    let mut results = results.into_iter();
    match (results.next(), results.next()) {
        (Some(result), None) => match result.server_error_code {
            Some(code) => Err(map_server_error_code(
                &code,
                result.reason.unwrap_or_default(),
            )),
            None => Ok(()),
        },
        (None, _) => Err(RemoteError::InvalidResponse(format!(
            "{what} response has no results"
        ))),
        (Some(_), Some(_)) => Err(RemoteError::InvalidResponse(format!(
            "{what} response has more results than operations"
        ))),
    }
}

// ============================================================================
// Operations
// ============================================================================

/// Creates the zone
///
/// An existing zone is reported as [`RemoteError::AlreadyExists`]; callers
/// treat that as success.
pub async fn save_zone(client: &RemoteClient, zone_id: &ZoneId) -> Result<(), RemoteError> {
    debug!(zone = %zone_id, "Saving zone");

    let request = ModifyRequest {
        operations: vec![ZoneOperation {
            operation_type: "create",
            zone: ZoneBody {
                zone_id: WireZoneId::from(zone_id),
            },
        }],
    };

    let response: ZonesResponse = client.post_json(ZONES_MODIFY_PATH, &request).await?;
    single_result(response.zones, "zone")?;

    info!(zone = %zone_id, "Zone saved");
    Ok(())
}

/// Creates or replaces a zone subscription
pub async fn save_subscription(
    client: &RemoteClient,
    subscription: &ZoneSubscription,
) -> Result<(), RemoteError> {
    debug!(
        subscription = %subscription.subscription_id,
        zone = %subscription.zone_id,
        "Saving subscription"
    );

    let request = ModifyRequest {
        operations: vec![SubscriptionOperation {
            operation_type: "replace",
            subscription: SubscriptionBody {
                subscription_id: subscription.subscription_id.as_str().to_string(),
                subscription_type: "zone",
                zone_id: WireZoneId::from(&subscription.zone_id),
                notification_info: NotificationInfo {
                    should_send_content_available: subscription.silent,
                },
            },
        }],
    };

    let response: SubscriptionsResponse =
        client.post_json(SUBSCRIPTIONS_MODIFY_PATH, &request).await?;
    single_result(response.subscriptions, "subscription")?;

    info!(subscription = %subscription.subscription_id, "Subscription saved");
    Ok(())
}
