//! Count reconciliation between the fixture loader and the file system.
//!
//! For each draft and plan, the loader's result is compared against an
//! independent enumeration of `<draft dir>/**/*.json` done with the `glob`
//! crate. The expected group count is derived by reading each enumerated
//! file as an untyped JSON value (an array contributes its length, anything
//! else contributes one), so the loader's file → group expansion is checked
//! rather than trusted.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;

use glob::{MatchOptions, Pattern};
use serde::Serialize;

use draftsuite_corpus::filter::PATH_MATCH_OPTIONS;
use draftsuite_corpus::{
    Draft, FilterError, FixtureLoader, FixturePath, GroupFilter, LoadError, SkipList, SkipTable,
};

use crate::structured_log::{LogEmitter, LogEntry, LogLevel, Outcome, StreamKind, emit_to};

/// One way of narrowing both sides of a count comparison.
#[derive(Debug, Clone)]
pub struct CountPlan {
    pub name: String,
    /// Excluded on both sides; matched against paths relative to the draft dir.
    pub ignore: Option<Pattern>,
    /// Exclude the draft's skip list on both sides.
    pub apply_skips: bool,
}

impl CountPlan {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ignore: None,
            apply_skips: false,
        }
    }

    /// Every fixture file, nothing excluded.
    #[must_use]
    pub fn all() -> Self {
        Self::new("all")
    }

    pub fn ignoring(name: impl Into<String>, pattern: &str) -> Result<Self, glob::PatternError> {
        Ok(Self {
            ignore: Some(Pattern::new(pattern)?),
            ..Self::new(name)
        })
    }

    #[must_use]
    pub fn with_skips(mut self) -> Self {
        self.apply_skips = true;
        self
    }

    fn excludes(&self, path: &FixturePath, skips: Option<&SkipList>) -> bool {
        self.ignore
            .as_ref()
            .is_some_and(|p| p.matches_with(path.as_str(), PATH_MATCH_OPTIONS))
            || skips.is_some_and(|s| s.contains(path))
    }
}

/// Which of the two reconciled quantities diverged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CountKind {
    Files,
    Groups,
}

impl fmt::Display for CountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Files => "file",
            Self::Groups => "group",
        })
    }
}

/// Both sides of one (draft, plan) comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountCheck {
    pub draft: Draft,
    pub plan: String,
    /// Files found by glob enumeration.
    pub files_on_disk: usize,
    /// Files the loader returned.
    pub files_loaded: usize,
    /// Groups implied by the enumerated files.
    pub groups_expected: usize,
    /// Groups the loader returned.
    pub groups_loaded: usize,
}

impl CountCheck {
    /// The first diverging count, files before groups.
    #[must_use]
    pub fn mismatch(&self) -> Option<(CountKind, usize, usize)> {
        if self.files_on_disk != self.files_loaded {
            Some((CountKind::Files, self.files_on_disk, self.files_loaded))
        } else if self.groups_expected != self.groups_loaded {
            Some((CountKind::Groups, self.groups_expected, self.groups_loaded))
        } else {
            None
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error(
        "{draft} [{plan}]: loaded {kind} count {actual} does not match {expected} expected from the file system (off by {delta:+})"
    )]
    CountMismatch {
        draft: Draft,
        plan: String,
        kind: CountKind,
        expected: usize,
        actual: usize,
        delta: i64,
        check: CountCheck,
    },
    #[error("[{plan}] {source}")]
    Load {
        draft: Draft,
        plan: String,
        #[source]
        source: LoadError,
    },
    #[error("{draft} [{plan}]: cannot enumerate {}: {source}", .path.display())]
    Glob {
        draft: Draft,
        plan: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{draft} [{plan}]: cannot count groups in {}: {source}", .path.display())]
    ExpectedCount {
        draft: Draft,
        plan: String,
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ReconcileError {
    #[must_use]
    pub fn draft(&self) -> Draft {
        match self {
            Self::CountMismatch { draft, .. }
            | Self::Load { draft, .. }
            | Self::Glob { draft, .. }
            | Self::ExpectedCount { draft, .. } => *draft,
        }
    }

    fn from_check(check: CountCheck) -> Option<Self> {
        let (kind, expected, actual) = check.mismatch()?;
        Some(Self::CountMismatch {
            draft: check.draft,
            plan: check.plan.clone(),
            kind,
            expected,
            actual,
            delta: actual as i64 - expected as i64,
            check,
        })
    }
}

/// Result of one (draft, plan) reconciliation.
#[derive(Debug)]
pub struct DraftOutcome {
    pub draft: Draft,
    pub plan: String,
    pub result: Result<CountCheck, ReconcileError>,
}

/// Serializable view of a [`DraftOutcome`].
#[derive(Debug, Clone, Serialize)]
pub struct OutcomeSummary {
    pub draft: Draft,
    pub plan: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check: Option<CountCheck>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// All outcomes of a reconciliation run.
#[derive(Debug, Default)]
pub struct ReconciliationReport {
    pub outcomes: Vec<DraftOutcome>,
}

/// A reconciliation run had at least one failure.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{} count reconciliation failure(s):\n{}", .failures.len(), .failures.join("\n"))]
pub struct ReconciliationFailed {
    pub failures: Vec<String>,
}

impl ReconciliationReport {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    #[must_use]
    pub fn failures(&self) -> Vec<&ReconcileError> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err())
            .collect()
    }

    /// Outcomes for `draft`, in plan order.
    pub fn for_draft(&self, draft: Draft) -> impl Iterator<Item = &DraftOutcome> {
        self.outcomes.iter().filter(move |o| o.draft == draft)
    }

    #[must_use]
    pub fn summaries(&self) -> Vec<OutcomeSummary> {
        self.outcomes
            .iter()
            .map(|o| {
                let check = match &o.result {
                    Ok(check) | Err(ReconcileError::CountMismatch { check, .. }) => {
                        Some(check.clone())
                    }
                    Err(_) => None,
                };
                OutcomeSummary {
                    draft: o.draft,
                    plan: o.plan.clone(),
                    passed: o.result.is_ok(),
                    check,
                    message: o.result.as_ref().err().map(ToString::to_string),
                }
            })
            .collect()
    }

    /// `Ok` when every outcome passed, otherwise one line per failure.
    pub fn ensure_clean(&self) -> Result<(), ReconciliationFailed> {
        let failures: Vec<String> = self.failures().iter().map(ToString::to_string).collect();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(ReconciliationFailed { failures })
        }
    }
}

/// Compares loader output with independent file-system enumeration.
pub struct Reconciler<'a> {
    loader: &'a FixtureLoader,
    skips: &'a SkipTable,
}

impl<'a> Reconciler<'a> {
    #[must_use]
    pub fn new(loader: &'a FixtureLoader, skips: &'a SkipTable) -> Self {
        Self { loader, skips }
    }

    /// Reconcile one draft under one plan.
    pub fn check(&self, draft: Draft, plan: &CountPlan) -> Result<CountCheck, ReconcileError> {
        let skips = if plan.apply_skips {
            self.skips.get(draft)
        } else {
            None
        };
        let narrow =
            |path: &FixturePath| -> Result<bool, FilterError> { Ok(!plan.excludes(path, skips)) };

        let loaded = self
            .loader
            .load_files(draft, Some(&narrow as &dyn GroupFilter))
            .map_err(|source| ReconcileError::Load {
                draft,
                plan: plan.name.clone(),
                source,
            })?;

        let draft_dir = self.loader.corpus().draft_dir(draft);
        let on_disk = enumerate_files(&draft_dir).map_err(|(path, source)| {
            ReconcileError::Glob {
                draft,
                plan: plan.name.clone(),
                path,
                source,
            }
        })?;
        let on_disk: Vec<PathBuf> = on_disk
            .into_iter()
            .filter(|path| {
                let relative = path.strip_prefix(&draft_dir).unwrap_or(path);
                !plan.excludes(&FixturePath::from_relative(relative), skips)
            })
            .collect();

        let mut groups_expected = 0;
        for path in &on_disk {
            groups_expected += expected_groups(path).map_err(|source| {
                ReconcileError::ExpectedCount {
                    draft,
                    plan: plan.name.clone(),
                    path: path.clone(),
                    source,
                }
            })?;
        }

        Ok(CountCheck {
            draft,
            plan: plan.name.clone(),
            files_on_disk: on_disk.len(),
            files_loaded: loaded.len(),
            groups_expected,
            groups_loaded: loaded.iter().map(|f| f.groups.len()).sum(),
        })
    }

    /// Reconcile every (draft, plan) pair. A failure for one draft never
    /// stops the others. Only log write failures are returned as errors.
    pub fn reconcile(
        &self,
        drafts: &[Draft],
        plans: &[CountPlan],
        log: Option<&mut LogEmitter>,
    ) -> std::io::Result<ReconciliationReport> {
        reconcile_with(drafts, plans, log, |draft, plan| self.check(draft, plan))
    }
}

fn reconcile_with<F>(
    drafts: &[Draft],
    plans: &[CountPlan],
    mut log: Option<&mut LogEmitter>,
    mut check: F,
) -> std::io::Result<ReconciliationReport>
where
    F: FnMut(Draft, &CountPlan) -> Result<CountCheck, ReconcileError>,
{
    let mut report = ReconciliationReport::default();
    for &draft in drafts {
        for plan in plans {
            let started = Instant::now();
            let result =
                check(draft, plan).and_then(|check| match ReconcileError::from_check(check.clone()) {
                    Some(err) => Err(err),
                    None => Ok(check),
                });
            emit_to(&mut log, count_check_entry(draft, plan, &result, started))?;
            report.outcomes.push(DraftOutcome {
                draft,
                plan: plan.name.clone(),
                result,
            });
        }
    }
    Ok(report)
}

fn count_check_entry(
    draft: Draft,
    plan: &CountPlan,
    result: &Result<CountCheck, ReconcileError>,
    started: Instant,
) -> LogEntry {
    let entry = LogEntry::new("", LogLevel::Info, "count_check")
        .with_stream(StreamKind::Reconcile)
        .with_draft(draft)
        .with_plan(&plan.name)
        .with_duration_ms(started.elapsed().as_millis() as u64);
    match result {
        Ok(check) => entry
            .with_outcome(Outcome::Pass)
            .with_comparison(
                serde_json::json!({"files": check.files_on_disk, "groups": check.groups_expected}),
                serde_json::json!({"files": check.files_loaded, "groups": check.groups_loaded}),
            ),
        Err(ReconcileError::CountMismatch {
            kind,
            expected,
            actual,
            ..
        }) => LogEntry {
            level: LogLevel::Error,
            ..entry
        }
        .with_outcome(Outcome::Fail)
        .with_comparison(serde_json::json!(expected), serde_json::json!(actual))
        .with_details(serde_json::json!({"count": kind})),
        Err(err) => LogEntry {
            level: LogLevel::Error,
            ..entry
        }
        .with_outcome(Outcome::Error)
        .with_details(serde_json::json!({"error": err.to_string()})),
    }
}

const ENUMERATE_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Files matching `<dir>/**/*.json`, sorted. A missing `dir` yields nothing.
pub fn enumerate_files(dir: &Path) -> Result<Vec<PathBuf>, (PathBuf, std::io::Error)> {
    let base = Pattern::escape(&dir.to_string_lossy());
    let pattern = format!("{base}/**/*.json");
    let paths = glob::glob_with(&pattern, ENUMERATE_OPTIONS).map_err(|e| {
        (
            dir.to_path_buf(),
            std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()),
        )
    })?;
    let mut files = Vec::new();
    for entry in paths {
        let path = entry.map_err(|e| (e.path().to_path_buf(), std::io::Error::from(e)))?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Groups a fixture file contributes: an array's length, otherwise one.
fn expected_groups(path: &Path) -> Result<usize, serde_json::Error> {
    let content = std::fs::read_to_string(path).map_err(serde_json::Error::io)?;
    let value: serde_json::Value = serde_json::from_str(&content)?;
    Ok(match value {
        serde_json::Value::Array(items) => items.len(),
        _ => 1,
    })
}
