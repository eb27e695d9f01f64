//! Key comparison operators for keyed data queues.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[cfg(test)]
#[path = "search_tests.rs"]
mod tests;

/// Comparison applied between the requested key and the keys on the queue.
///
/// The short code is what the host receives; the label is what
/// configuration screens show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SearchType {
    #[serde(rename = "EQ")]
    Equal,
    #[serde(rename = "NE")]
    NotEqual,
    #[serde(rename = "LT")]
    LessThan,
    #[serde(rename = "LE")]
    LessThanOrEqual,
    #[serde(rename = "GT")]
    GreaterThan,
    #[serde(rename = "GE")]
    GreaterThanOrEqual,
}

impl SearchType {
    pub const ALL: [SearchType; 6] = [
        Self::Equal,
        Self::NotEqual,
        Self::LessThan,
        Self::LessThanOrEqual,
        Self::GreaterThan,
        Self::GreaterThanOrEqual,
    ];

    /// Code sent to the host
    pub fn code(&self) -> &'static str {
        match self {
            Self::Equal => "EQ",
            Self::NotEqual => "NE",
            Self::LessThan => "LT",
            Self::LessThanOrEqual => "LE",
            Self::GreaterThan => "GT",
            Self::GreaterThanOrEqual => "GE",
        }
    }

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Equal => "equal",
            Self::NotEqual => "not equal",
            Self::LessThan => "less than",
            Self::LessThanOrEqual => "less than or equal",
            Self::GreaterThan => "greater than",
            Self::GreaterThanOrEqual => "greater than or equal",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|search| search.label() == label)
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|search| search.code().eq_ignore_ascii_case(code))
    }

    /// Check whether an entry key satisfies the comparison against `requested`
    pub fn matches(&self, entry_key: &str, requested: &str) -> bool {
        match self {
            Self::Equal => entry_key == requested,
            Self::NotEqual => entry_key != requested,
            Self::LessThan => entry_key < requested,
            Self::LessThanOrEqual => entry_key <= requested,
            Self::GreaterThan => entry_key > requested,
            Self::GreaterThanOrEqual => entry_key >= requested,
        }
    }
}

impl std::fmt::Display for SearchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Accepts either the short code or the label
impl FromStr for SearchType {
    type Err = crate::error::ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::from_code(trimmed)
            .or_else(|| Self::from_label(trimmed))
            .ok_or_else(|| crate::error::ConfigurationError::Invalid {
                message: format!("unknown key search type '{trimmed}'"),
            })
    }
}
