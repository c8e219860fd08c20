//! Core domain types for busync.
//!
//! Everything in this crate is plain data: no IO, no async, no HTTP. The
//! transport crate produces these types from wire payloads; the engine
//! consumes them when deciding what (if anything) to reconcile.

mod application;
mod decision;
mod ids;
mod naming;

pub use application::{Application, BusinessUnit};
pub use decision::{Action, Decision, RunMode};
pub use ids::{AppGuid, BuGuid};
pub use naming::{UNIT_KEY_LEN, UnitKey, UnitKeyError};
