//! Draft identifiers and their dialect metadata.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A numbered JSON Schema draft.
///
/// Any number is representable so that an unknown draft fails when its
/// corpus subtree is resolved, not when the identifier is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Draft(u32);

impl Draft {
    pub const DRAFT3: Self = Self(3);
    pub const DRAFT4: Self = Self(4);
    pub const DRAFT6: Self = Self(6);
    pub const DRAFT7: Self = Self(7);

    /// Drafts with a known dialect, in ascending order.
    pub const KNOWN: [Self; 4] = [Self::DRAFT3, Self::DRAFT4, Self::DRAFT6, Self::DRAFT7];

    #[must_use]
    pub const fn new(number: u32) -> Self {
        Self(number)
    }

    #[must_use]
    pub const fn number(self) -> u32 {
        self.0
    }

    #[must_use]
    pub fn is_known(self) -> bool {
        Self::KNOWN.contains(&self)
    }

    /// Directory name of this draft under `<root>/tests/` (e.g. `draft7`).
    #[must_use]
    pub fn dir_name(self) -> String {
        format!("draft{}", self.0)
    }

    /// Human-facing title used by reports (e.g. `draft-07`).
    #[must_use]
    pub fn title(self) -> String {
        format!("draft-{:02}", self.0)
    }

    /// Canonical metaschema URI for this draft.
    #[must_use]
    pub fn meta_schema_uri(self) -> String {
        format!("http://json-schema.org/draft-{:02}/schema#", self.0)
    }

    /// Keyword carrying a schema's base URI: `id` up to draft 4, `$id` after.
    #[must_use]
    pub const fn id_keyword(self) -> &'static str {
        if self.0 <= 4 { "id" } else { "$id" }
    }

    /// Parse `7`, `draft7`, `draft-07` or `draft 7` (case-insensitive).
    #[must_use]
    pub fn from_str_loose(s: &str) -> Option<Self> {
        let lower = s.trim().to_ascii_lowercase();
        let digits = lower
            .strip_prefix("draft")
            .unwrap_or(&lower)
            .trim_start_matches(['-', ' ', '_']);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok().map(Self)
    }
}

impl fmt::Display for Draft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "draft {}", self.0)
    }
}

/// Error returned when a draft identifier cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized draft identifier: '{0}'")]
pub struct ParseDraftError(pub String);

impl FromStr for Draft {
    type Err = ParseDraftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_loose(s).ok_or_else(|| ParseDraftError(s.to_string()))
    }
}
