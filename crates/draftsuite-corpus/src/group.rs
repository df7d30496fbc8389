//! Test group records parsed from fixture files.

use std::fmt;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Identity of a fixture file relative to its draft directory.
///
/// Always `/`-separated. [`FixturePath::as_str`] keeps the `.json`
/// extension; [`FixturePath::id`] drops it and is what skip lists name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FixturePath(String);

impl FixturePath {
    #[must_use]
    pub fn new(relative: impl Into<String>) -> Self {
        Self(relative.into().replace('\\', "/"))
    }

    /// Build from a path already relative to the draft directory.
    #[must_use]
    pub fn from_relative(relative: &Path) -> Self {
        let parts: Vec<String> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        Self(parts.join("/"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn id(&self) -> &str {
        self.0.strip_suffix(".json").unwrap_or(&self.0)
    }

    /// Last segment of [`FixturePath::id`].
    #[must_use]
    pub fn file_stem(&self) -> &str {
        let id = self.id();
        id.rsplit_once('/').map_or(id, |(_, stem)| stem)
    }

    /// True if `entry` names this fixture: an exact id, or a trailing run of
    /// whole path segments (`format/iri` names `optional/format/iri`).
    #[must_use]
    pub fn matches_id(&self, entry: &str) -> bool {
        let entry = entry.trim_matches('/');
        let entry = entry.strip_suffix(".json").unwrap_or(entry);
        let id = self.id();
        if entry.is_empty() {
            return false;
        }
        id == entry
            || id
                .strip_suffix(entry)
                .is_some_and(|prefix| prefix.ends_with('/'))
    }
}

impl fmt::Display for FixturePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One data/expected-result pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub description: String,
    pub data: serde_json::Value,
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// A named bundle of one schema plus its test cases.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestGroup {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Opaque schema document, passed through unchanged.
    pub schema: serde_json::Value,
    pub tests: Vec<TestCase>,
    /// Fixture file this group came from.
    pub source: FixturePath,
    /// Position of this group within its source file.
    pub index: usize,
}

/// On-disk shape of a group before its source identity is attached.
#[derive(Debug, Deserialize)]
struct RawGroup {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    comment: Option<String>,
    schema: serde_json::Value,
    tests: Vec<TestCase>,
}

impl RawGroup {
    fn into_group(self, source: &FixturePath, index: usize) -> TestGroup {
        TestGroup {
            description: self
                .description
                .unwrap_or_else(|| source.file_stem().to_string()),
            comment: self.comment,
            schema: self.schema,
            tests: self.tests,
            source: source.clone(),
            index,
        }
    }
}

/// All groups parsed from one fixture file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FixtureFile {
    pub path: FixturePath,
    pub groups: Vec<TestGroup>,
}

/// Parse fixture content: a single group object or an array of them.
pub fn parse_groups(source: &FixturePath, content: &str) -> Result<Vec<TestGroup>, serde_json::Error> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                serde_json::from_value::<RawGroup>(item).map(|raw| raw.into_group(source, index))
            })
            .collect(),
        value @ serde_json::Value::Object(_) => {
            let raw: RawGroup = serde_json::from_value(value)?;
            Ok(vec![raw.into_group(source, 0)])
        }
        other => Err(<serde_json::Error as serde::de::Error>::custom(format!(
            "expected a test group object or an array of groups, found {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// SHA-256 over the canonical JSON encoding of a load, lowercase hex.
///
/// Two loads of an unchanged corpus produce the same fingerprint.
#[must_use]
pub fn fingerprint(groups: &[TestGroup]) -> String {
    let mut hasher = Sha256::new();
    for group in groups {
        // Serializing plain data into a Vec cannot fail.
        let bytes = serde_json::to_vec(group).unwrap_or_default();
        hasher.update((bytes.len() as u64).to_le_bytes());
        hasher.update(&bytes);
    }
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}
