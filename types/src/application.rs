use crate::{AppGuid, BuGuid};

/// An application profile as listed by the remote tenant.
///
/// Read-only from this tool's perspective except for the unit assignment,
/// which the apply executor may rewrite. The tool never creates or deletes
/// applications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Application {
    /// Identifier, absent or blank for malformed tenant records.
    pub guid: Option<AppGuid>,
    pub name: String,
    /// Current business-unit assignment, if any.
    pub business_unit: Option<BuGuid>,
}

/// A business unit known to the remote tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusinessUnit {
    pub guid: BuGuid,
    pub name: String,
}
