//! Selector normalization and validation.
//!
//! A selector is the literal string `"all"`, a comma-separated string, or an
//! explicit list. Validation is a pure function of the selector and the
//! supported-target registry.

use crate::error::{PackagerError, Result};
use std::str::FromStr;

/// Requested architecture or platform selection before validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selector {
    /// Every entry of the supported set, in registry order
    All,
    /// Explicit entries, validated against the supported set
    List(Vec<String>),
}

impl Selector {
    /// Convenience constructor from string-like entries.
    pub fn list<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Selector::List(entries.into_iter().map(Into::into).collect())
    }
}

impl From<&str> for Selector {
    /// Splits comma-separated strings; `"all"` selects the whole registry.
    fn from(s: &str) -> Self {
        if s == "all" {
            return Selector::All;
        }
        Selector::List(
            s.split(',')
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(String::from)
                .collect(),
        )
    }
}

impl FromStr for Selector {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Selector::from(s))
    }
}

/// Normalizes a selector against a supported set.
///
/// `supported` is the registry's key list in registry order; `lookup` maps a
/// validated name to its typed entry. The first unsupported entry fails with
/// an error naming the entry and the full supported set. A missing or empty
/// selector fails with "must specify" wording.
pub fn validate_selector<T: Copy>(
    field: &str,
    selector: Option<&Selector>,
    supported: &[T],
    name_of: impl Fn(&T) -> &'static str,
    lookup: impl Fn(&str) -> Option<T>,
) -> Result<Vec<T>> {
    let selector = selector.ok_or_else(|| PackagerError::Validation {
        reason: format!("must specify {field}"),
    })?;

    match selector {
        Selector::All => Ok(supported.to_vec()),
        Selector::List(entries) => {
            if entries.is_empty() {
                return Err(PackagerError::Validation {
                    reason: format!("must specify {field}"),
                });
            }
            let mut validated = Vec::with_capacity(entries.len());
            for entry in entries {
                match lookup(entry) {
                    Some(value) => validated.push(value),
                    None => {
                        let supported_names: Vec<_> = supported.iter().map(&name_of).collect();
                        return Err(PackagerError::Validation {
                            reason: format!(
                                "unsupported {field} \"{entry}\"; supported: {}",
                                supported_names.join(", ")
                            ),
                        });
                    }
                }
            }
            Ok(validated)
        }
    }
}
