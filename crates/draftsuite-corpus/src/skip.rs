//! Per-draft exclusion lists.
//!
//! A skip entry names a fixture by id (`optional/content`) or by a trailing
//! run of its path segments (`format/iri` also names `optional/format/iri`).
//! The same table feeds loader filters and the harness skip mechanism so
//! both sides agree on what is excluded.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::draft::Draft;
use crate::filter::{FilterError, GroupFilter};
use crate::group::FixturePath;

/// Fixture ids excluded for one draft.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkipList {
    entries: BTreeSet<String>,
}

impl SkipList {
    #[must_use]
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(Into::into).collect(),
        }
    }

    /// The entry naming `path`, if any.
    #[must_use]
    pub fn matching_entry(&self, path: &FixturePath) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| path.matches_id(entry))
            .map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, path: &FixturePath) -> bool {
        self.matching_entry(path).is_some()
    }

    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl GroupFilter for SkipList {
    fn accepts(&self, path: &FixturePath) -> Result<bool, FilterError> {
        Ok(!self.contains(path))
    }
}

/// A skip table entry referenced a draft outside the supported set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("skip table references {draft}, which is not among the supported drafts {supported:?}")]
pub struct UnknownDraftError {
    pub draft: Draft,
    pub supported: Vec<u32>,
}

/// Explicit draft → skip list mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkipTable {
    lists: BTreeMap<Draft, SkipList>,
}

impl SkipTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fixtures excluded from validator runs by default: draft 4 float
    /// formatting, and draft 7 formats/content assertions that validators
    /// commonly leave unimplemented.
    #[must_use]
    pub fn default_exclusions() -> Self {
        Self::new()
            .with(Draft::DRAFT4, ["optional/zeroTerminatedFloats"])
            .with(
                Draft::DRAFT7,
                [
                    "format/idn-email",
                    "format/idn-hostname",
                    "format/iri",
                    "format/iri-reference",
                    "optional/content",
                ],
            )
    }

    /// Add entries for `draft`, merging with any already present.
    #[must_use]
    pub fn with<I, S>(mut self, draft: Draft, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(draft, entries);
        self
    }

    pub fn insert<I, S>(&mut self, draft: Draft, entries: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lists
            .entry(draft)
            .or_default()
            .entries
            .extend(entries.into_iter().map(Into::into));
    }

    #[must_use]
    pub fn get(&self, draft: Draft) -> Option<&SkipList> {
        self.lists.get(&draft)
    }

    pub fn drafts(&self) -> impl Iterator<Item = Draft> + '_ {
        self.lists.keys().copied()
    }

    /// Reject entries for drafts outside `supported`.
    pub fn validate(&self, supported: &[Draft]) -> Result<(), UnknownDraftError> {
        match self.drafts().find(|d| !supported.contains(d)) {
            Some(draft) => Err(UnknownDraftError {
                draft,
                supported: supported.iter().map(|d| d.number()).collect(),
            }),
            None => Ok(()),
        }
    }
}
