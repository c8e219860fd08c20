//! Full-fidelity application updates.

use serde_json::Value;

use busync_client::{ApiError, TenantApi};
use busync_types::{AppGuid, BuGuid};

/// Assign `target` as the application's business unit.
///
/// Fetches the full document and submits the complete profile back with only
/// the unit reference changed, so unrelated profile fields survive the round
/// trip unmodified.
pub async fn apply_assignment<C: TenantApi>(
    client: &C,
    guid: &AppGuid,
    target: &BuGuid,
) -> Result<(), ApiError> {
    let full = client.get_application(guid).await?;

    let mut profile = match full.get("profile") {
        Some(Value::Object(map)) => Value::Object(map.clone()),
        None | Some(Value::Null) => serde_json::json!({}),
        Some(_) => {
            return Err(ApiError::Malformed {
                context: "application detail",
                detail: "profile is not an object".to_string(),
            });
        }
    };
    profile["business_unit"] = serde_json::json!({ "guid": target.as_str() });

    client.update_application(guid, profile).await?;
    tracing::info!(app = %guid, unit = %target, "assigned business unit");
    Ok(())
}
