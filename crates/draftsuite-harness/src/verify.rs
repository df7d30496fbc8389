//! Per-case verdicts and their aggregation.

use serde::{Deserialize, Serialize};

use crate::structured_log::Outcome;

/// Result of running a single test case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    /// Fixture path relative to the draft directory.
    pub fixture: String,
    /// Description of the enclosing test group.
    pub group: String,
    /// Description of the test case.
    pub case: String,
    pub outcome: Outcome,
    /// Validity the fixture asserts.
    pub expected: bool,
    /// Validity the validator reported, when it ran.
    pub actual: Option<bool>,
    /// Skip reason or validator error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl VerificationResult {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.outcome == Outcome::Pass
    }
}

/// Aggregate verification summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerificationSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Cases where the validator itself returned an error.
    pub errored: usize,
    pub results: Vec<VerificationResult>,
}

impl VerificationSummary {
    /// Build a summary from a list of results.
    #[must_use]
    pub fn from_results(results: Vec<VerificationResult>) -> Self {
        let count = |outcome| results.iter().filter(|r| r.outcome == outcome).count();
        Self {
            total: results.len(),
            passed: count(Outcome::Pass),
            failed: count(Outcome::Fail),
            skipped: count(Outcome::Skip),
            errored: count(Outcome::Error),
            results,
        }
    }

    /// True when nothing failed or errored. Skips do not count against a run.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed == 0 && self.errored == 0
    }

    /// Results that failed or errored.
    pub fn problems(&self) -> impl Iterator<Item = &VerificationResult> {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, Outcome::Fail | Outcome::Error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(case: &str, outcome: Outcome) -> VerificationResult {
        VerificationResult {
            fixture: "type.json".to_string(),
            group: "integer type".to_string(),
            case: case.to_string(),
            outcome,
            expected: true,
            actual: None,
            message: None,
        }
    }

    #[test]
    fn counts_each_outcome() {
        let summary = VerificationSummary::from_results(vec![
            result("a", Outcome::Pass),
            result("b", Outcome::Pass),
            result("c", Outcome::Fail),
            result("d", Outcome::Skip),
            result("e", Outcome::Error),
        ]);
        assert_eq!(
            (summary.total, summary.passed, summary.failed, summary.skipped, summary.errored),
            (5, 2, 1, 1, 1)
        );
        assert!(!summary.all_passed());
        let problems: Vec<_> = summary.problems().map(|r| r.case.as_str()).collect();
        assert_eq!(problems, ["c", "e"]);
    }

    #[test]
    fn skips_alone_still_pass() {
        let summary = VerificationSummary::from_results(vec![
            result("a", Outcome::Pass),
            result("b", Outcome::Skip),
        ]);
        assert!(summary.all_passed());
    }
}
