//! Draft-scoped fixture loading for the JSON Schema conformance corpus.
//!
//! This crate provides:
//! - Draft identifiers and the pure draft → subtree mapping
//! - Fixture discovery: recursive, lexicographically ordered `*.json` walk
//! - Test group parsing: one file holds one group or an array of groups
//! - Filters and per-draft skip tables applied to fixture paths
//! - Remote reference documents served at synthetic URIs
//!
//! The corpus is treated as read-only. Every load reads from disk; nothing
//! is cached between calls.

pub mod corpus;
pub mod draft;
pub mod filter;
pub mod group;
pub mod loader;
pub mod remotes;
pub mod skip;

pub use corpus::{Corpus, draft_subtree};
pub use draft::Draft;
pub use filter::{FilterChain, FilterError, GroupFilter, PathSelector};
pub use group::{FixtureFile, FixturePath, TestCase, TestGroup, fingerprint};
pub use loader::{FixtureLoader, LoadError};
pub use remotes::{DEFAULT_REMOTE_BASE, RemoteDocument, RemoteSet};
pub use skip::{SkipList, SkipTable, UnknownDraftError};
