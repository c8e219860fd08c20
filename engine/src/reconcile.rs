//! Per-application reconciliation decisions.

use busync_client::TenantApi;
use busync_types::{Action, Application, Decision, RunMode, UnitKey};

use crate::apply;
use crate::resolver::UnitResolver;

/// Decide and (in live mode) enact the correct unit assignment for one
/// application. Failures fold into the decision as [`Action::Errored`]; they
/// never abort the caller's loop.
pub async fn reconcile_app<C: TenantApi>(
    client: &C,
    resolver: &mut UnitResolver,
    app: &Application,
    mode: RunMode,
) -> Decision {
    let mut decision = Decision {
        app_name: app.name.clone(),
        app_guid: app.guid.clone(),
        unit_key: None,
        current_unit: app.business_unit.clone(),
        target_unit: None,
        would_create_unit: false,
        action: Action::SkippedNoIdentifier,
        note: String::new(),
    };

    let Some(guid) = app.guid.as_ref().filter(|guid| !guid.is_blank()) else {
        decision.note = "record has no identifier".to_string();
        return decision;
    };

    let Some(key) = UnitKey::from_app_name(&app.name) else {
        decision.action = Action::SkippedNoMatch;
        decision.note = "name does not follow the unit naming convention".to_string();
        return decision;
    };
    decision.unit_key = Some(key.clone());

    let resolution = match resolver.resolve(client, &key, mode).await {
        Ok(resolution) => resolution,
        Err(e) => {
            decision.action = Action::Errored;
            decision.note = format!("unit resolution failed: {e}");
            return decision;
        }
    };
    decision.would_create_unit = resolution.requires_create();
    decision.target_unit = resolution.guid.clone();

    match resolution.guid {
        Some(target) if app.business_unit.as_ref() == Some(&target) => {
            decision.action = Action::AlreadyCorrect;
            decision.note = format!("already in unit {key}");
        }
        Some(target) => {
            if mode.is_dry_run() {
                decision.action = Action::WouldAssign;
            } else {
                match apply::apply_assignment(client, guid, &target).await {
                    Ok(()) => decision.action = Action::Assigned,
                    Err(e) => {
                        decision.action = Action::Errored;
                        decision.note = format!("assignment failed: {e}");
                    }
                }
            }
        }
        // Dry-run with the unit itself still missing; assignment is implied
        // by the creation that a live run would perform first.
        None => {
            decision.action = Action::WouldAssign;
            decision.note = format!("unit {key} would be created first");
        }
    }

    decision
}
