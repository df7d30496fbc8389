//! Test execution engine.

use draftsuite_corpus::{Draft, RemoteSet, SkipList, TestGroup};

use crate::structured_log::{LogEmitter, LogEntry, LogLevel, Outcome, StreamKind, emit_to};
use crate::validator::{SchemaValidator, ValidatorError};
use crate::verify::VerificationResult;

/// Register remote documents and, when given, the draft's metaschema.
pub fn prepare<V: SchemaValidator>(
    validator: &mut V,
    remotes: &RemoteSet,
    meta_schema: Option<&serde_json::Value>,
) -> Result<(), ValidatorError> {
    for remote in remotes.iter() {
        validator
            .add_schema(&remote.document, &remote.uri)
            .map_err(|err| ValidatorError::new(format!("remote {}: {err}", remote.uri)))?;
    }
    if let Some(document) = meta_schema {
        validator
            .add_meta_schema(document)
            .map_err(|err| ValidatorError::new(format!("metaschema: {err}")))?;
    }
    Ok(())
}

/// Runs loaded groups for one draft through a validator.
pub struct SuiteRunner<'a> {
    pub draft: Draft,
    /// Groups whose fixture is listed here are reported as skipped and never run.
    pub skips: Option<&'a SkipList>,
}

impl<'a> SuiteRunner<'a> {
    #[must_use]
    pub fn new(draft: Draft, skips: Option<&'a SkipList>) -> Self {
        Self { draft, skips }
    }

    /// Run every case of `groups`, in order.
    ///
    /// Validator errors become [`Outcome::Error`] results; only log write
    /// failures abort the run.
    pub fn run<V: SchemaValidator>(
        &self,
        validator: &mut V,
        groups: &[TestGroup],
        mut log: Option<&mut LogEmitter>,
    ) -> std::io::Result<Vec<VerificationResult>> {
        let mut results = Vec::new();
        for group in groups {
            if let Some(entry) = self.skips.and_then(|s| s.matching_entry(&group.source)) {
                let reason = format!("skip list entry '{entry}'");
                emit_to(
                    &mut log,
                    self.entry(LogLevel::Info, "skip", group)
                        .with_outcome(Outcome::Skip)
                        .with_details(serde_json::json!({ "reason": &reason })),
                )?;
                results.extend(group.tests.iter().map(|case| VerificationResult {
                    fixture: group.source.to_string(),
                    group: group.description.clone(),
                    case: case.description.clone(),
                    outcome: Outcome::Skip,
                    expected: case.valid,
                    actual: None,
                    message: Some(reason.clone()),
                }));
                continue;
            }

            for case in &group.tests {
                let result = match validator.validate(&group.schema, &case.data) {
                    Ok(actual) => VerificationResult {
                        fixture: group.source.to_string(),
                        group: group.description.clone(),
                        case: case.description.clone(),
                        outcome: if actual == case.valid {
                            Outcome::Pass
                        } else {
                            Outcome::Fail
                        },
                        expected: case.valid,
                        actual: Some(actual),
                        message: None,
                    },
                    Err(err) => VerificationResult {
                        fixture: group.source.to_string(),
                        group: group.description.clone(),
                        case: case.description.clone(),
                        outcome: Outcome::Error,
                        expected: case.valid,
                        actual: None,
                        message: Some(err.to_string()),
                    },
                };
                let level = match result.outcome {
                    Outcome::Pass | Outcome::Skip => LogLevel::Debug,
                    Outcome::Fail | Outcome::Error => LogLevel::Warn,
                };
                let mut details = serde_json::json!({ "case": &case.description });
                if let Some(message) = &result.message {
                    details["error"] = serde_json::json!(message);
                }
                emit_to(
                    &mut log,
                    self.entry(level, "case_result", group)
                        .with_outcome(result.outcome)
                        .with_comparison(
                            serde_json::json!(result.expected),
                            serde_json::json!(result.actual),
                        )
                        .with_details(details),
                )?;
                results.push(result);
            }
        }
        Ok(results)
    }

    fn entry(&self, level: LogLevel, event: &str, group: &TestGroup) -> LogEntry {
        LogEntry::new("", level, event)
            .with_stream(StreamKind::Validate)
            .with_draft(self.draft)
            .with_fixture(group.source.as_str(), Some(group.description.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use draftsuite_corpus::FixturePath;
    use draftsuite_corpus::group::parse_groups;

    /// Accepts integers only; errors on a schema containing `"boom"`.
    struct IntegerOnly {
        registered: Vec<String>,
    }

    impl SchemaValidator for IntegerOnly {
        fn add_schema(&mut self, _: &serde_json::Value, uri: &str) -> Result<(), ValidatorError> {
            self.registered.push(uri.to_string());
            Ok(())
        }
        fn add_meta_schema(&mut self, _: &serde_json::Value) -> Result<(), ValidatorError> {
            self.registered.push("meta".to_string());
            Ok(())
        }
        fn validate(
            &mut self,
            schema: &serde_json::Value,
            instance: &serde_json::Value,
        ) -> Result<bool, ValidatorError> {
            if schema.get("boom").is_some() {
                return Err(ValidatorError::new("unsupported keyword boom"));
            }
            Ok(instance.is_i64() || instance.is_u64())
        }
    }

    fn groups(path: &str, json: &str) -> Vec<TestGroup> {
        parse_groups(&FixturePath::new(path), json).unwrap()
    }

    const INTEGER: &str = r#"{"description":"integer","schema":{"type":"integer"},"tests":[
        {"description":"one","data":1,"valid":true},
        {"description":"float","data":1.5,"valid":false},
        {"description":"wrong expectation","data":"x","valid":true}
    ]}"#;

    #[test]
    fn records_pass_fail_and_error() {
        let mut all = groups("type.json", INTEGER);
        all.extend(groups(
            "boom.json",
            r#"{"description":"boom","schema":{"boom":true},"tests":[{"description":"b","data":1,"valid":true}]}"#,
        ));
        let mut validator = IntegerOnly { registered: vec![] };
        let results = SuiteRunner::new(Draft::DRAFT7, None)
            .run(&mut validator, &all, None)
            .unwrap();
        let outcomes: Vec<_> = results.iter().map(|r| r.outcome).collect();
        assert_eq!(
            outcomes,
            [Outcome::Pass, Outcome::Pass, Outcome::Fail, Outcome::Error]
        );
        assert_eq!(results[3].message.as_deref(), Some("unsupported keyword boom"));
        assert_eq!(results[2].actual, Some(false));
    }

    #[test]
    fn skipped_groups_never_reach_the_validator() {
        let all = groups(
            "optional/format/iri.json",
            r#"{"description":"iri","schema":{"boom":true},"tests":[{"description":"a","data":1,"valid":true}]}"#,
        );
        let skips = SkipList::new(["format/iri"]);
        let mut validator = IntegerOnly { registered: vec![] };
        let mut log = LogEmitter::to_buffer("draftsuite", "t");
        let results = SuiteRunner::new(Draft::DRAFT7, Some(&skips))
            .run(&mut validator, &all, Some(&mut log))
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].outcome, Outcome::Skip);
        assert_eq!(results[0].message.as_deref(), Some("skip list entry 'format/iri'"));
        assert_eq!(log.emitted(), 1);
    }

    #[test]
    fn prepare_registers_remotes_then_metaschema() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("remotes")).unwrap();
        std::fs::write(dir.path().join("remotes/integer.json"), r#"{"type":"integer"}"#).unwrap();
        let remotes = RemoteSet::load(
            &draftsuite_corpus::Corpus::new(dir.path()),
            draftsuite_corpus::DEFAULT_REMOTE_BASE,
        )
        .unwrap();
        let mut validator = IntegerOnly { registered: vec![] };
        prepare(&mut validator, &remotes, Some(&serde_json::json!({}))).unwrap();
        assert_eq!(
            validator.registered,
            ["http://localhost:1234/integer.json", "meta"]
        );
    }
}
