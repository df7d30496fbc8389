//! End-to-end conformance runs over every configured draft.

use std::path::PathBuf;
use std::time::Instant;

use draftsuite_corpus::{Draft, FixtureLoader, RemoteSet, TestGroup, fingerprint};

use crate::config::{ConfigError, HarnessConfig, HarnessSettings};
use crate::reconcile::{ReconciliationFailed, ReconciliationReport, Reconciler};
use crate::report::{ConformanceReport, DraftReport};
use crate::runner::{SuiteRunner, prepare};
use crate::structured_log::{LogEmitter, LogEntry, LogLevel, Outcome, StreamKind, emit_to, now_utc};
use crate::validator::{ValidatorError, ValidatorFactory, ValidatorOptions};
use crate::verify::VerificationSummary;

#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Load(#[from] draftsuite_corpus::LoadError),
    #[error(transparent)]
    Reconciliation(#[from] ReconciliationFailed),
    #[error("{draft}: validator setup failed: {source}")]
    Validator {
        draft: Draft,
        #[source]
        source: ValidatorError,
    },
    #[error("{draft}: cannot read metaschema {}: {source}", .path.display())]
    MetaSchemaRead {
        draft: Draft,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{draft}: invalid metaschema {}: {source}", .path.display())]
    MetaSchemaParse {
        draft: Draft,
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("log write failed: {0}")]
    Log(#[from] std::io::Error),
}

/// A configured corpus ready to reconcile and run.
#[derive(Debug)]
pub struct ConformanceSuite {
    settings: HarnessSettings,
    loader: FixtureLoader,
}

impl ConformanceSuite {
    #[must_use]
    pub fn new(settings: HarnessSettings) -> Self {
        let loader = FixtureLoader::new(settings.corpus.clone());
        Self { settings, loader }
    }

    /// Validate `config` and build a suite from it.
    pub fn from_config(config: &HarnessConfig) -> Result<Self, HarnessError> {
        Ok(Self::new(config.validate()?))
    }

    #[must_use]
    pub fn settings(&self) -> &HarnessSettings {
        &self.settings
    }

    #[must_use]
    pub fn loader(&self) -> &FixtureLoader {
        &self.loader
    }

    /// Reconcile every configured draft under every configured plan.
    pub fn reconcile(
        &self,
        log: Option<&mut LogEmitter>,
    ) -> Result<ReconciliationReport, HarnessError> {
        Ok(Reconciler::new(&self.loader, &self.settings.skips).reconcile(
            &self.settings.drafts,
            &self.settings.count_plans,
            log,
        )?)
    }

    /// Reconcile and fail unless every count matched.
    pub fn verify_counts(&self, log: Option<&mut LogEmitter>) -> Result<(), HarnessError> {
        self.reconcile(log)?.ensure_clean()?;
        Ok(())
    }

    /// Load, prepare a validator for, and run one draft.
    pub fn run_draft<F: ValidatorFactory>(
        &self,
        factory: &F,
        draft: Draft,
        remotes: &RemoteSet,
        mut log: Option<&mut LogEmitter>,
    ) -> Result<DraftReport, HarnessError> {
        let started = Instant::now();
        let files = self.loader.load_files(draft, None)?;
        let groups: Vec<TestGroup> = files.iter().flat_map(|f| f.groups.clone()).collect();
        let fingerprint = fingerprint(&groups);
        emit_to(
            &mut log,
            LogEntry::new("", LogLevel::Info, "draft_load")
                .with_stream(StreamKind::Load)
                .with_draft(draft)
                .with_duration_ms(started.elapsed().as_millis() as u64)
                .with_details(serde_json::json!({
                    "files": files.len(),
                    "groups": groups.len(),
                    "fingerprint": &fingerprint,
                })),
        )?;

        let meta_schema = self.meta_schema(draft)?;
        let options = ValidatorOptions::for_draft(draft, self.settings.format_assertions);
        let mut validator = factory
            .build(&options)
            .map_err(|source| HarnessError::Validator { draft, source })?;
        prepare(&mut validator, remotes, meta_schema.as_ref())
            .map_err(|source| HarnessError::Validator { draft, source })?;

        let skips = self.settings.skips.get(draft);
        let results = SuiteRunner::new(draft, skips).run(&mut validator, &groups, log)?;

        Ok(DraftReport {
            files: files.len(),
            groups: groups.len(),
            fingerprint: Some(fingerprint),
            skipped_fixtures: files
                .iter()
                .filter(|f| skips.is_some_and(|s| s.contains(&f.path)))
                .map(|f| f.path.to_string())
                .collect(),
            summary: VerificationSummary::from_results(results),
            ..DraftReport::new(draft)
        })
    }

    /// Reconcile every configured draft, then run each of `run_drafts`. A
    /// draft that cannot be loaded or prepared is reported as failed without
    /// stopping the others.
    pub fn run<F: ValidatorFactory>(
        &self,
        factory: &F,
        mut log: Option<&mut LogEmitter>,
    ) -> Result<ConformanceReport, HarnessError> {
        let started = Instant::now();
        let reconciliation = self.reconcile(log.as_deref_mut())?;
        let remotes = RemoteSet::load(&self.settings.corpus, &self.settings.remote_base_uri)?;

        let mut drafts = Vec::with_capacity(self.settings.run_drafts.len());
        for &draft in &self.settings.run_drafts {
            let report = match self.run_draft(factory, draft, &remotes, log.as_deref_mut()) {
                Ok(report) => report,
                Err(HarnessError::Log(err)) => return Err(HarnessError::Log(err)),
                Err(err) => {
                    emit_to(
                        &mut log,
                        LogEntry::new("", LogLevel::Error, "draft_load")
                            .with_stream(StreamKind::Load)
                            .with_draft(draft)
                            .with_outcome(Outcome::Error)
                            .with_details(serde_json::json!({ "error": err.to_string() })),
                    )?;
                    DraftReport::failed(draft, err)
                }
            };
            drafts.push(report);
        }

        let report = ConformanceReport {
            title: "draftsuite conformance".to_string(),
            timestamp: now_utc(),
            corpus_root: self.settings.corpus.root().display().to_string(),
            reconciliation: reconciliation.summaries(),
            drafts,
        };
        emit_to(
            &mut log,
            LogEntry::new(
                "",
                if report.passed() {
                    LogLevel::Info
                } else {
                    LogLevel::Error
                },
                "suite_run",
            )
            .with_outcome(if report.passed() {
                Outcome::Pass
            } else {
                Outcome::Fail
            })
            .with_duration_ms(started.elapsed().as_millis() as u64)
            .with_details(serde_json::json!({
                "drafts": report.drafts.len(),
                "reconciliation_failures": reconciliation.failures().len(),
            })),
        )?;
        Ok(report)
    }

    fn meta_schema(&self, draft: Draft) -> Result<Option<serde_json::Value>, HarnessError> {
        let Some(path) = self.settings.meta_schemas.get(&draft) else {
            return Ok(None);
        };
        let content =
            std::fs::read_to_string(path).map_err(|source| HarnessError::MetaSchemaRead {
                draft,
                path: path.clone(),
                source,
            })?;
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| HarnessError::MetaSchemaParse {
                draft,
                path: path.clone(),
                source,
            })
    }
}
