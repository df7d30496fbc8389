//! Harness configuration.
//!
//! Configuration is explicit: the corpus root is always a configured path,
//! either from a JSON file or from the `DRAFTSUITE_CORPUS_ROOT` environment
//! variable, never the working directory. [`HarnessConfig::validate`] runs
//! once at startup and turns the raw file shape into [`HarnessSettings`].
//!
//! ```json
//! {
//!   "corpus_root": "vendor/JSON-Schema-Test-Suite",
//!   "drafts": [4, 6, 7],
//!   "format_assertions": true,
//!   "skip": { "draft7": ["optional/content"] },
//!   "count_plans": [{ "name": "all" }]
//! }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use draftsuite_corpus::{Corpus, DEFAULT_REMOTE_BASE, Draft, SkipTable, UnknownDraftError};

use crate::reconcile::CountPlan;

/// Environment variable naming the corpus root.
pub const CORPUS_ROOT_ENV: &str = "DRAFTSUITE_CORPUS_ROOT";

/// Drafts run through the validator when `run_drafts` is not set. Draft 3
/// is reconciled but never run.
pub const DEFAULT_RUN_DRAFTS: [Draft; 3] = [Draft::DRAFT4, Draft::DRAFT6, Draft::DRAFT7];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("corpus root is not configured (set DRAFTSUITE_CORPUS_ROOT or `corpus_root`)")]
    MissingCorpusRoot,
    #[error("no drafts configured")]
    NoDrafts,
    #[error("{0} is listed more than once")]
    DuplicateDraft(Draft),
    #[error("'{key}' in `{section}` is not a draft identifier")]
    InvalidDraftKey { section: &'static str, key: String },
    #[error(transparent)]
    UnknownSkipDraft(#[from] UnknownDraftError),
    #[error("meta schema configured for {0}, which is not among the supported drafts")]
    UnknownMetaSchemaDraft(Draft),
    #[error("{0} is listed in `run_drafts` but not in `drafts`")]
    RunDraftNotConfigured(Draft),
    #[error("count plan '{plan}' has an invalid ignore pattern '{pattern}': {source}")]
    InvalidPattern {
        plan: String,
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
    #[error("count plan name '{0}' is used more than once")]
    DuplicatePlan(String),
}

/// One reconciliation plan as written in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountPlanConfig {
    pub name: String,
    /// Glob relative to the draft directory excluded on both sides.
    #[serde(default)]
    pub ignore: Option<String>,
    /// Also exclude the draft's skip list on both sides.
    #[serde(default)]
    pub apply_skips: bool,
}

/// Raw configuration, as read from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub corpus_root: PathBuf,
    /// Drafts whose counts are reconciled.
    pub drafts: Vec<Draft>,
    /// Drafts run through the validator; a subset of `drafts`. Unset means
    /// [`DEFAULT_RUN_DRAFTS`] narrowed to `drafts`.
    pub run_drafts: Option<Vec<Draft>>,
    /// Whether validators treat `format` as an assertion.
    pub format_assertions: bool,
    /// Draft key (`"7"`, `"draft7"`, `"draft-07"`) → skipped fixture ids.
    pub skip: BTreeMap<String, Vec<String>>,
    pub count_plans: Vec<CountPlanConfig>,
    /// Draft key → metaschema document registered before a run.
    pub meta_schemas: BTreeMap<String, PathBuf>,
    pub remote_base_uri: String,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        let defaults = SkipTable::default_exclusions();
        let skip: BTreeMap<String, Vec<String>> = defaults
            .drafts()
            .filter_map(|draft| {
                defaults.get(draft).map(|list| {
                    (
                        draft.dir_name(),
                        list.entries().map(str::to_string).collect::<Vec<_>>(),
                    )
                })
            })
            .collect();
        Self {
            corpus_root: PathBuf::new(),
            drafts: Draft::KNOWN.to_vec(),
            run_drafts: None,
            format_assertions: true,
            skip,
            count_plans: vec![CountPlanConfig {
                name: "all".to_string(),
                ignore: None,
                apply_skips: false,
            }],
            meta_schemas: BTreeMap::new(),
            remote_base_uri: DEFAULT_REMOTE_BASE.to_string(),
        }
    }
}

impl HarnessConfig {
    /// Defaults rooted at `root`.
    #[must_use]
    pub fn for_corpus(root: impl Into<PathBuf>) -> Self {
        Self {
            corpus_root: root.into(),
            ..Self::default()
        }
    }

    /// Load from a JSON file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Defaults rooted at `$DRAFTSUITE_CORPUS_ROOT`.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CORPUS_ROOT_ENV) {
            Some(root) if !root.is_empty() => Ok(Self::for_corpus(root)),
            _ => Err(ConfigError::MissingCorpusRoot),
        }
    }

    /// Check the configuration and resolve it into typed settings.
    pub fn validate(&self) -> Result<HarnessSettings, ConfigError> {
        if self.corpus_root.as_os_str().is_empty() {
            return Err(ConfigError::MissingCorpusRoot);
        }
        if self.drafts.is_empty() {
            return Err(ConfigError::NoDrafts);
        }
        let drafts = distinct(&self.drafts)?;
        let run_drafts = match &self.run_drafts {
            Some(listed) => {
                let listed = distinct(listed)?;
                if let Some(&missing) = listed.iter().find(|d| !drafts.contains(d)) {
                    return Err(ConfigError::RunDraftNotConfigured(missing));
                }
                listed
            }
            None => DEFAULT_RUN_DRAFTS
                .into_iter()
                .filter(|d| drafts.contains(d))
                .collect(),
        };

        // Skip and metaschema keys may name any known draft, configured or not.
        let mut supported = Draft::KNOWN.to_vec();
        supported.extend(drafts.iter().filter(|d| !d.is_known()));

        let mut skips = SkipTable::new();
        for (key, entries) in &self.skip {
            skips.insert(parse_draft_key("skip", key)?, entries.iter().cloned());
        }
        skips.validate(&supported)?;

        let mut meta_schemas = BTreeMap::new();
        for (key, path) in &self.meta_schemas {
            let draft = parse_draft_key("meta_schemas", key)?;
            if !supported.contains(&draft) {
                return Err(ConfigError::UnknownMetaSchemaDraft(draft));
            }
            meta_schemas.insert(draft, self.corpus_root.join(path));
        }

        let mut count_plans: Vec<CountPlan> = Vec::with_capacity(self.count_plans.len());
        for raw in &self.count_plans {
            if count_plans.iter().any(|p| p.name == raw.name) {
                return Err(ConfigError::DuplicatePlan(raw.name.clone()));
            }
            let mut plan = match &raw.ignore {
                Some(pattern) => CountPlan::ignoring(&raw.name, pattern).map_err(|source| {
                    ConfigError::InvalidPattern {
                        plan: raw.name.clone(),
                        pattern: pattern.clone(),
                        source,
                    }
                })?,
                None => CountPlan::new(&raw.name),
            };
            if raw.apply_skips {
                plan = plan.with_skips();
            }
            count_plans.push(plan);
        }
        if count_plans.is_empty() {
            count_plans.push(CountPlan::all());
        }

        Ok(HarnessSettings {
            corpus: Corpus::new(&self.corpus_root),
            drafts,
            run_drafts,
            format_assertions: self.format_assertions,
            skips,
            count_plans,
            meta_schemas,
            remote_base_uri: self.remote_base_uri.clone(),
        })
    }
}

fn distinct(listed: &[Draft]) -> Result<Vec<Draft>, ConfigError> {
    let mut drafts: Vec<Draft> = Vec::with_capacity(listed.len());
    for &draft in listed {
        if drafts.contains(&draft) {
            return Err(ConfigError::DuplicateDraft(draft));
        }
        drafts.push(draft);
    }
    Ok(drafts)
}

fn parse_draft_key(section: &'static str, key: &str) -> Result<Draft, ConfigError> {
    Draft::from_str_loose(key).ok_or_else(|| ConfigError::InvalidDraftKey {
        section,
        key: key.to_string(),
    })
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct HarnessSettings {
    pub corpus: Corpus,
    /// Reconciled drafts, in configured order.
    pub drafts: Vec<Draft>,
    /// Drafts run through the validator, in configured order.
    pub run_drafts: Vec<Draft>,
    pub format_assertions: bool,
    pub skips: SkipTable,
    pub count_plans: Vec<CountPlan>,
    /// Resolved metaschema paths (relative entries join the corpus root).
    pub meta_schemas: BTreeMap<Draft, PathBuf>,
    pub remote_base_uri: String,
}
