//! Business-unit resolution with a run-scoped cache.

use std::collections::HashMap;

use busync_client::{ApiError, TenantApi};
use busync_types::{BuGuid, RunMode, UnitKey};

/// How a unit key was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// Served from the run cache; no network call was made.
    Cached,
    /// Found on the tenant by name lookup.
    Found,
    /// Created on the tenant (live mode only).
    Created,
    /// Absent on the tenant; creation withheld (dry-run only).
    WouldCreate,
}

/// Result of resolving a unit key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Unit identifier, or `None` while creation is withheld in dry-run.
    pub guid: Option<BuGuid>,
    pub outcome: ResolveOutcome,
}

impl Resolution {
    /// True for the resolution that first required the unit to be created.
    #[must_use]
    pub fn requires_create(&self) -> bool {
        matches!(
            self.outcome,
            ResolveOutcome::Created | ResolveOutcome::WouldCreate
        )
    }
}

/// Maps unit keys to remote identifiers, creating units on demand.
///
/// The cache lives for one run only; the tenant stays the source of truth
/// across runs. A `None` entry marks a unit whose creation was withheld in
/// dry-run, so the tenant is asked about each missing key exactly once.
#[derive(Debug, Default)]
pub struct UnitResolver {
    cache: HashMap<UnitKey, Option<BuGuid>>,
}

impl UnitResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn resolve<C: TenantApi>(
        &mut self,
        client: &C,
        key: &UnitKey,
        mode: RunMode,
    ) -> Result<Resolution, ApiError> {
        if let Some(cached) = self.cache.get(key) {
            return Ok(Resolution {
                guid: cached.clone(),
                outcome: ResolveOutcome::Cached,
            });
        }

        if let Some(unit) = client.find_business_unit(key).await? {
            tracing::debug!(key = %key, guid = %unit.guid, "business unit exists");
            self.cache.insert(key.clone(), Some(unit.guid.clone()));
            return Ok(Resolution {
                guid: Some(unit.guid),
                outcome: ResolveOutcome::Found,
            });
        }

        if mode.is_dry_run() {
            tracing::info!(key = %key, "business unit missing; creation withheld");
            self.cache.insert(key.clone(), None);
            return Ok(Resolution {
                guid: None,
                outcome: ResolveOutcome::WouldCreate,
            });
        }

        let unit = client.create_business_unit(key).await?;
        self.cache.insert(key.clone(), Some(unit.guid.clone()));
        Ok(Resolution {
            guid: Some(unit.guid),
            outcome: ResolveOutcome::Created,
        })
    }
}
