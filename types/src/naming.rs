//! The naming convention that drives unit assignment.
//!
//! An application opts into automatic assignment by starting its name with
//! four letters and a dash: `ENGN-payments-service` belongs to unit `ENGN`.
//! Names that do not follow the convention are skipped, never rejected.

use std::fmt;

/// Number of letters that make up a unit key.
pub const UNIT_KEY_LEN: usize = 4;

const SEPARATOR: char = '-';

/// A business-unit key derived from an application name.
///
/// Invariant: exactly [`UNIT_KEY_LEN`] ASCII letters, stored uppercased.
/// Keys are case-insensitive: `engn-x` and `ENGN-y` derive the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(transparent)]
pub struct UnitKey(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnitKeyError {
    #[error("unit key must be exactly {UNIT_KEY_LEN} characters, got {0}")]
    Length(usize),
    #[error("unit key must be ASCII alphabetic")]
    NonAlphabetic,
}

impl UnitKey {
    /// Validated constructor for a bare key; uppercases its input.
    pub fn new(key: &str) -> Result<Self, UnitKeyError> {
        let len = key.chars().count();
        if len != UNIT_KEY_LEN {
            return Err(UnitKeyError::Length(len));
        }
        if !key.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(UnitKeyError::NonAlphabetic);
        }
        Ok(Self(key.to_ascii_uppercase()))
    }

    /// Derive the unit key from an application name.
    ///
    /// Returns `Some` only when the name starts with exactly
    /// [`UNIT_KEY_LEN`] ASCII letters immediately followed by `-`. Short
    /// names, non-letter prefixes, and missing separators are non-conforming
    /// names, not errors.
    #[must_use]
    pub fn from_app_name(name: &str) -> Option<Self> {
        let prefix = name.get(..UNIT_KEY_LEN)?;
        if !prefix.chars().all(|c| c.is_ascii_alphabetic()) {
            return None;
        }
        // get() succeeding above proves UNIT_KEY_LEN is a char boundary.
        if !name[UNIT_KEY_LEN..].starts_with(SEPARATOR) {
            return None;
        }
        Some(Self(prefix.to_ascii_uppercase()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
