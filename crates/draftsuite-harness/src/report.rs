//! Report generation for conformance runs.

use std::fmt::Write as _;

use serde::Serialize;

use draftsuite_corpus::Draft;

use crate::reconcile::OutcomeSummary;
use crate::verify::VerificationSummary;

/// Results for one draft.
#[derive(Debug, Clone, Serialize)]
pub struct DraftReport {
    pub draft: Draft,
    /// `Test suite draft-0N`.
    pub title: String,
    pub files: usize,
    pub groups: usize,
    /// Fingerprint of the loaded groups, when the load succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    /// Fixtures the skip list excluded from execution.
    pub skipped_fixtures: Vec<String>,
    /// Set when the draft could not be loaded or its validator not built.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub summary: VerificationSummary,
}

impl DraftReport {
    #[must_use]
    pub fn new(draft: Draft) -> Self {
        Self {
            draft,
            title: suite_title(draft),
            files: 0,
            groups: 0,
            fingerprint: None,
            skipped_fixtures: Vec::new(),
            error: None,
            summary: VerificationSummary::default(),
        }
    }

    #[must_use]
    pub fn failed(draft: Draft, error: impl ToString) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::new(draft)
        }
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        self.error.is_none() && self.summary.all_passed()
    }
}

/// Title of a draft's suite in reports.
#[must_use]
pub fn suite_title(draft: Draft) -> String {
    format!("Test suite {}", draft.title())
}

/// A conformance report combining reconciliation and validation results.
#[derive(Debug, Clone, Serialize)]
pub struct ConformanceReport {
    pub title: String,
    /// Timestamp (UTC).
    pub timestamp: String,
    pub corpus_root: String,
    pub reconciliation: Vec<OutcomeSummary>,
    pub drafts: Vec<DraftReport>,
}

impl ConformanceReport {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.reconciliation.iter().all(|o| o.passed) && self.drafts.iter().all(DraftReport::passed)
    }

    /// Render the report as markdown.
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# {}\n", self.title);
        let _ = writeln!(out, "- Corpus: {}", self.corpus_root);
        let _ = writeln!(out, "- Timestamp: {}", self.timestamp);
        let _ = writeln!(
            out,
            "- Result: {}\n",
            if self.passed() { "PASS" } else { "FAIL" }
        );

        out.push_str("## Count reconciliation\n\n");
        out.push_str("| Draft | Plan | Files | Groups | Status |\n");
        out.push_str("|-------|------|-------|--------|--------|\n");
        for o in &self.reconciliation {
            let (files, groups) = o.check.as_ref().map_or_else(
                || ("-".to_string(), "-".to_string()),
                |c| {
                    (
                        format!("{}/{}", c.files_loaded, c.files_on_disk),
                        format!("{}/{}", c.groups_loaded, c.groups_expected),
                    )
                },
            );
            let status = if o.passed { "PASS" } else { "FAIL" };
            let _ = writeln!(
                out,
                "| {} | {} | {files} | {groups} | {status} |",
                o.draft.title(),
                o.plan
            );
        }
        for o in self.reconciliation.iter().filter(|o| !o.passed) {
            if let Some(message) = &o.message {
                let _ = writeln!(out, "\n> {message}");
            }
        }

        for draft in &self.drafts {
            let _ = writeln!(out, "\n## {}\n", draft.title);
            if let Some(error) = &draft.error {
                let _ = writeln!(out, "Not run: {error}");
                continue;
            }
            let s = &draft.summary;
            let _ = writeln!(out, "- Files: {}", draft.files);
            let _ = writeln!(out, "- Groups: {}", draft.groups);
            let _ = writeln!(
                out,
                "- Cases: {} ({} passed, {} failed, {} skipped, {} errored)",
                s.total, s.passed, s.failed, s.skipped, s.errored
            );
            if let Some(fingerprint) = &draft.fingerprint {
                let _ = writeln!(out, "- Fingerprint: `{fingerprint}`");
            }
            if !draft.skipped_fixtures.is_empty() {
                let _ = writeln!(out, "- Skipped: {}", draft.skipped_fixtures.join(", "));
            }
            let problems: Vec<_> = s.problems().collect();
            if !problems.is_empty() {
                out.push_str("\n| Fixture | Group | Case | Status |\n");
                out.push_str("|---------|-------|------|--------|\n");
                for r in problems {
                    let _ = writeln!(
                        out,
                        "| {} | {} | {} | {:?} |",
                        r.fixture, r.group, r.case, r.outcome
                    );
                }
            }
        }
        out
    }

    /// Render the report as JSON.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::CountCheck;
    use crate::structured_log::Outcome;
    use crate::verify::VerificationResult;

    fn report() -> ConformanceReport {
        let mut draft7 = DraftReport::new(Draft::DRAFT7);
        draft7.files = 2;
        draft7.groups = 3;
        draft7.skipped_fixtures = vec!["optional/content.json".to_string()];
        draft7.summary = VerificationSummary::from_results(vec![VerificationResult {
            fixture: "type.json".to_string(),
            group: "integer".to_string(),
            case: "a float".to_string(),
            outcome: Outcome::Fail,
            expected: false,
            actual: Some(true),
            message: None,
        }]);
        ConformanceReport {
            title: "draftsuite conformance".to_string(),
            timestamp: "2026-01-01T00:00:00.000Z".to_string(),
            corpus_root: "/corpus".to_string(),
            reconciliation: vec![
                OutcomeSummary {
                    draft: Draft::DRAFT7,
                    plan: "all".to_string(),
                    passed: true,
                    check: Some(CountCheck {
                        draft: Draft::DRAFT7,
                        plan: "all".to_string(),
                        files_on_disk: 2,
                        files_loaded: 2,
                        groups_expected: 3,
                        groups_loaded: 3,
                    }),
                    message: None,
                },
                OutcomeSummary {
                    draft: Draft::new(99),
                    plan: "all".to_string(),
                    passed: false,
                    check: None,
                    message: Some("[all] draft 99 has no corpus subtree".to_string()),
                },
            ],
            drafts: vec![draft7, DraftReport::failed(Draft::new(99), "no subtree")],
        }
    }

    #[test]
    fn markdown_lists_counts_and_problems() {
        let md = report().to_markdown();
        assert!(md.contains("- Result: FAIL"));
        assert!(md.contains("| draft-07 | all | 2/2 | 3/3 | PASS |"));
        assert!(md.contains("| draft-99 | all | - | - | FAIL |"));
        assert!(md.contains("> [all] draft 99 has no corpus subtree"));
        assert!(md.contains("## Test suite draft-07"));
        assert!(md.contains("| type.json | integer | a float | Fail |"));
        assert!(md.contains("Not run: no subtree"));
    }

    #[test]
    fn json_carries_drafts_as_numbers() {
        let value: serde_json::Value = serde_json::from_str(&report().to_json()).unwrap();
        assert_eq!(value["drafts"][0]["draft"], 7);
        assert_eq!(value["drafts"][0]["title"], "Test suite draft-07");
        assert_eq!(value["reconciliation"][1]["passed"], false);
    }
}
