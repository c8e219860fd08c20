//! Reconciliation engine.
//!
//! Walks the tenant's application listing, derives a target unit for every
//! conforming name, and decides per application whether to skip, assign, or
//! report. All remote access goes through the [`busync_client::TenantApi`]
//! trait, so the whole engine runs against an in-memory fake in tests.
//!
//! Control flow: [`pager`] -> [`reconcile`] -> ([`report`] | [`apply`]),
//! with [`resolver`] consulted for the key-to-unit mapping along the way.

pub mod apply;
pub mod pager;
pub mod reconcile;
pub mod report;
pub mod resolver;
pub mod run;

#[cfg(test)]
pub(crate) mod testutil;

pub use pager::ApplicationPager;
pub use report::{REPORT_FILE_NAME, ReportError, write_report};
pub use resolver::{Resolution, ResolveOutcome, UnitResolver};
pub use run::{RunReport, RunSummary, execute};
