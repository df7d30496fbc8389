//! Integration test: loaded counts reconcile with the file system for every
//! draft of the checked-in sample corpus.

use std::fs;
use std::path::{Path, PathBuf};

use draftsuite_corpus::{Corpus, Draft, FixtureLoader, SkipTable};
use draftsuite_harness::reconcile::{CountKind, enumerate_files};
use draftsuite_harness::{
    ConformanceSuite, CountPlan, HarnessConfig, HarnessError, ReconcileError, Reconciler,
};
use tempfile::TempDir;

fn workspace_root() -> PathBuf {
    let manifest = env!("CARGO_MANIFEST_DIR");
    Path::new(manifest)
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .to_path_buf()
}

fn sample_root() -> PathBuf {
    workspace_root().join("tests/suite")
}

fn plans() -> Vec<CountPlan> {
    vec![
        CountPlan::all(),
        CountPlan::ignoring("required", "optional/**").unwrap(),
        CountPlan::new("skips").with_skips(),
    ]
}

#[test]
fn every_known_draft_reconciles_under_every_plan() {
    let loader = FixtureLoader::new(Corpus::new(sample_root()));
    let skips = SkipTable::default_exclusions();
    let report = Reconciler::new(&loader, &skips)
        .reconcile(&Draft::KNOWN, &plans(), None)
        .unwrap();

    assert_eq!(report.outcomes.len(), Draft::KNOWN.len() * 3);
    assert!(report.passed(), "{:?}", report.failures());
    report.ensure_clean().unwrap();

    let counts = |draft: Draft, plan: &str| {
        let outcome = report
            .for_draft(draft)
            .find(|o| o.plan == plan)
            .unwrap();
        let check = outcome.result.as_ref().unwrap();
        (check.files_loaded, check.groups_loaded)
    };
    assert_eq!(counts(Draft::DRAFT7, "all"), (7, 10));
    assert_eq!(counts(Draft::DRAFT7, "required"), (3, 6));
    assert_eq!(counts(Draft::DRAFT7, "skips"), (4, 7));
    assert_eq!(counts(Draft::DRAFT4, "skips"), (4, 6));
    assert_eq!(counts(Draft::DRAFT3, "skips"), (3, 5));
}

#[test]
fn glob_enumeration_agrees_with_loader_file_order() {
    let loader = FixtureLoader::new(Corpus::new(sample_root()));
    for draft in Draft::KNOWN {
        let dir = loader.corpus().draft_dir(draft);
        let globbed: Vec<PathBuf> = enumerate_files(&dir).unwrap();
        let discovered: Vec<PathBuf> = loader
            .discover(draft)
            .unwrap()
            .into_iter()
            .map(|(_, full)| full)
            .collect();
        assert_eq!(globbed.len(), discovered.len(), "{draft}");
        for path in &discovered {
            assert!(globbed.contains(path), "{} not globbed", path.display());
        }
    }
}

#[test]
fn unknown_draft_is_the_only_failure() {
    let loader = FixtureLoader::new(Corpus::new(sample_root()));
    let skips = SkipTable::new();
    let drafts = [
        Draft::DRAFT3,
        Draft::DRAFT4,
        Draft::new(99),
        Draft::DRAFT6,
        Draft::DRAFT7,
    ];
    let report = Reconciler::new(&loader, &skips)
        .reconcile(&drafts, &[CountPlan::all()], None)
        .unwrap();

    let failures = report.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].draft(), Draft::new(99));
    assert!(matches!(failures[0], ReconcileError::Load { .. }));
    let message = failures[0].to_string();
    assert!(message.contains("draft 99"), "{message}");
    for draft in Draft::KNOWN {
        assert!(report.for_draft(draft).all(|o| o.result.is_ok()), "{draft}");
    }

    let err = report.ensure_clean().unwrap_err();
    assert_eq!(err.failures.len(), 1);
    assert!(err.to_string().contains("draft 99"));
}

#[test]
fn malformed_fixture_fails_that_draft_only() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    for draft in ["draft6", "draft7"] {
        let path = root.join("tests").join(draft).join("type.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"[{"description":"a","schema":{},"tests":[]}]"#).unwrap();
    }
    fs::write(root.join("tests/draft6/broken.json"), "{\"description\":").unwrap();

    let loader = FixtureLoader::new(Corpus::new(root));
    let skips = SkipTable::new();
    let report = Reconciler::new(&loader, &skips)
        .reconcile(&[Draft::DRAFT6, Draft::DRAFT7], &[CountPlan::all()], None)
        .unwrap();
    let failures = report.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].draft(), Draft::DRAFT6);
    assert!(failures[0].to_string().contains("broken.json"));
}

#[test]
fn empty_group_array_counts_zero_on_both_sides() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tests/draft7/empty.json");
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, "[]").unwrap();

    let loader = FixtureLoader::new(Corpus::new(dir.path()));
    let skips = SkipTable::new();
    let check = Reconciler::new(&loader, &skips)
        .check(Draft::DRAFT7, &CountPlan::all())
        .unwrap();
    assert_eq!((check.files_on_disk, check.files_loaded), (1, 1));
    assert_eq!((check.groups_expected, check.groups_loaded), (0, 0));
    assert_eq!(check.mismatch(), None);
}

#[test]
fn mismatch_reports_kind_and_delta() {
    let err = ReconcileError::CountMismatch {
        draft: Draft::DRAFT4,
        plan: "all".to_string(),
        kind: CountKind::Files,
        expected: 42,
        actual: 41,
        delta: -1,
        check: draftsuite_harness::CountCheck {
            draft: Draft::DRAFT4,
            plan: "all".to_string(),
            files_on_disk: 42,
            files_loaded: 41,
            groups_expected: 120,
            groups_loaded: 117,
        },
    };
    assert_eq!(
        err.to_string(),
        "draft 4 [all]: loaded file count 41 does not match 42 expected from the file system (off by -1)"
    );
}

#[test]
fn suite_verifies_counts_from_config() {
    let suite = ConformanceSuite::from_config(&HarnessConfig::for_corpus(sample_root())).unwrap();
    suite.verify_counts(None).unwrap();

    let mut config = HarnessConfig::for_corpus(sample_root());
    config.drafts.push(Draft::new(99));
    let suite = ConformanceSuite::from_config(&config).unwrap();
    match suite.verify_counts(None) {
        Err(HarnessError::Reconciliation(failed)) => {
            assert_eq!(failed.failures.len(), 1);
            assert!(failed.failures[0].contains("draft 99"));
        }
        other => panic!("expected a reconciliation failure, got {other:?}"),
    }
}
