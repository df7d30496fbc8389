//! Conformance harness for the draftsuite corpus.
//!
//! This crate provides:
//! - Count reconciliation: loaded fixture counts checked against the file system
//! - Validator seam: dialect options and the traits an engine implements
//! - Suite runs: skip-aware execution of every test case per draft
//! - Report generation: markdown and JSON conformance reports
//! - Structured JSONL logging and harness configuration

#![forbid(unsafe_code)]

pub mod config;
pub mod reconcile;
pub mod report;
pub mod runner;
pub mod structured_log;
pub mod suite;
pub mod validator;
pub mod verify;

pub use config::{ConfigError, HarnessConfig, HarnessSettings};
pub use reconcile::{CountCheck, CountPlan, ReconcileError, ReconciliationReport, Reconciler};
pub use report::{ConformanceReport, DraftReport};
pub use runner::SuiteRunner;
pub use suite::{ConformanceSuite, HarnessError};
pub use validator::{Dialect, SchemaValidator, ValidatorError, ValidatorFactory, ValidatorOptions};
pub use verify::{VerificationResult, VerificationSummary};
