//! End-to-end run orchestration.

use std::collections::BTreeMap;
use std::fmt;

use busync_client::{ApiError, TenantApi};
use busync_types::{Action, Decision, RunMode};

use crate::pager::ApplicationPager;
use crate::reconcile;
use crate::resolver::UnitResolver;

/// Counts per action over a completed run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    counts: BTreeMap<&'static str, usize>,
    total: usize,
}

impl RunSummary {
    fn record(&mut self, action: Action) {
        *self.counts.entry(action.as_str()).or_insert(0) += 1;
        self.total += 1;
    }

    #[must_use]
    pub fn count(&self, action: Action) -> usize {
        self.counts.get(action.as_str()).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} applications processed", self.total)?;
        for (action, count) in &self.counts {
            write!(f, ", {action}={count}")?;
        }
        Ok(())
    }
}

/// Outcome of a run: every decision plus the aggregate counts.
#[derive(Debug)]
pub struct RunReport {
    pub decisions: Vec<Decision>,
    pub summary: RunSummary,
}

/// List every application and reconcile each one in turn.
///
/// Per-application failures become [`Action::Errored`] decisions and the run
/// continues. A listing page that cannot be fetched is fatal instead: an
/// incomplete enumeration would make the report lie about coverage.
pub async fn execute<C: TenantApi>(client: &C, mode: RunMode) -> Result<RunReport, ApiError> {
    let mut resolver = UnitResolver::new();
    let mut pager = ApplicationPager::new();
    let mut decisions = Vec::new();
    let mut summary = RunSummary::default();

    while let Some(apps) = pager.next_page(client).await? {
        for app in &apps {
            let decision = reconcile_logged(client, &mut resolver, app, mode).await;
            summary.record(decision.action);
            decisions.push(decision);
        }
    }

    tracing::info!(%summary, "run complete");
    Ok(RunReport { decisions, summary })
}

async fn reconcile_logged<C: TenantApi>(
    client: &C,
    resolver: &mut UnitResolver,
    app: &busync_types::Application,
    mode: RunMode,
) -> Decision {
    let decision = reconcile::reconcile_app(client, resolver, app, mode).await;
    let key = decision.unit_key.as_ref().map_or("", |key| key.as_str());
    match decision.action {
        Action::Errored => {
            tracing::error!(app = %decision.app_name, note = %decision.note, "reconciliation failed");
        }
        Action::Assigned | Action::WouldAssign => {
            tracing::info!(app = %decision.app_name, unit = key, action = %decision.action, "reconciled");
        }
        Action::AlreadyCorrect | Action::SkippedNoMatch | Action::SkippedNoIdentifier => {
            tracing::debug!(app = %decision.app_name, action = %decision.action, "skipped");
        }
    }
    decision
}
