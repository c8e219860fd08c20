use std::fmt;

use crate::{AppGuid, BuGuid, UnitKey};

/// Whether a run is allowed to mutate remote state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Compute decisions and write the report; issue no mutating calls.
    DryRun,
    /// Create missing units and assign applications remotely.
    Live,
}

impl RunMode {
    #[must_use]
    pub const fn is_dry_run(self) -> bool {
        matches!(self, Self::DryRun)
    }
}

/// What happened (or would happen) to a single application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Already assigned to the derived unit; nothing to do.
    AlreadyCorrect,
    /// Mismatch found; assignment withheld because of dry-run.
    WouldAssign,
    /// Assignment written to the tenant.
    Assigned,
    /// Name does not follow the unit naming convention.
    SkippedNoMatch,
    /// Record has no usable identifier.
    SkippedNoIdentifier,
    /// Processing failed after retries; the run continued.
    Errored,
}

impl Action {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AlreadyCorrect => "none",
            Self::WouldAssign => "would-assign",
            Self::Assigned => "assigned",
            Self::SkippedNoMatch => "skipped-no-match",
            Self::SkippedNoIdentifier => "skipped-no-identifier",
            Self::Errored => "errored",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reconciliation decision. Immutable once recorded; the dry-run report
/// serializes these verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub app_name: String,
    pub app_guid: Option<AppGuid>,
    /// Derived unit key, absent for non-conforming names.
    pub unit_key: Option<UnitKey>,
    pub current_unit: Option<BuGuid>,
    /// Absent when unit creation was withheld (dry-run) or never derived.
    pub target_unit: Option<BuGuid>,
    /// True for the application that triggered (or would trigger) creation
    /// of its unit. Later applications sharing the key hit the cache.
    pub would_create_unit: bool,
    pub action: Action,
    pub note: String,
}
