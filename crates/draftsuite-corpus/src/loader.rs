//! Fixture discovery and loading for one draft at a time.
//!
//! Loads are fail-fast: the first unreadable or malformed fixture aborts
//! the load with the offending path named. Nothing is cached; every call
//! walks and parses the corpus again so corpus drift is always visible.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::corpus::Corpus;
use crate::draft::Draft;
use crate::filter::{FilterError, GroupFilter};
use crate::group::{FixtureFile, FixturePath, TestGroup, parse_groups};

/// Fixture files are recognized by this suffix.
pub const FIXTURE_SUFFIX: &str = ".json";

/// Errors that can occur when loading fixtures.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("{draft} has no corpus subtree at {}", .path.display())]
    DraftNotFound { draft: Draft, path: PathBuf },

    #[error("malformed fixture {}: {source}", .path.display())]
    MalformedFixture {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("filter failed on {path}: {source}")]
    Filter {
        path: FixturePath,
        #[source]
        source: FilterError,
    },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Loads test groups from a corpus, one draft per call.
#[derive(Debug, Clone)]
pub struct FixtureLoader {
    corpus: Corpus,
}

impl FixtureLoader {
    #[must_use]
    pub fn new(corpus: Corpus) -> Self {
        Self { corpus }
    }

    #[must_use]
    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    /// Load every test group for `draft`, in fixture path order.
    ///
    /// A file holding an array of N groups contributes N records sharing
    /// its source path.
    pub fn load(
        &self,
        draft: Draft,
        filter: Option<&dyn GroupFilter>,
    ) -> Result<Vec<TestGroup>, LoadError> {
        Ok(self
            .load_files(draft, filter)?
            .into_iter()
            .flat_map(|file| file.groups)
            .collect())
    }

    /// Load `draft` as one entry per fixture file.
    pub fn load_files(
        &self,
        draft: Draft,
        filter: Option<&dyn GroupFilter>,
    ) -> Result<Vec<FixtureFile>, LoadError> {
        let mut files = Vec::new();
        for (path, full) in self.discover(draft)? {
            if let Some(filter) = filter {
                let keep = filter.accepts(&path).map_err(|source| LoadError::Filter {
                    path: path.clone(),
                    source,
                })?;
                if !keep {
                    continue;
                }
            }
            let content = read_fixture(&full)?;
            let groups = parse_groups(&path, &content).map_err(|source| {
                LoadError::MalformedFixture {
                    path: full.clone(),
                    source,
                }
            })?;
            files.push(FixtureFile { path, groups });
        }
        Ok(files)
    }

    /// Fixture paths under `draft`'s subtree, sorted, without reading them.
    pub fn discover(&self, draft: Draft) -> Result<Vec<(FixturePath, PathBuf)>, LoadError> {
        let dir = self.corpus.draft_dir(draft);
        if !dir.is_dir() {
            return Err(LoadError::DraftNotFound { draft, path: dir });
        }
        discover_fixture_files(&dir)
    }
}

/// Recursively collect `*.json` files under `dir`, ordered by their
/// `/`-separated relative path.
pub(crate) fn discover_fixture_files(dir: &Path) -> Result<Vec<(FixturePath, PathBuf)>, LoadError> {
    let mut found = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = entry.map_err(|err| LoadError::Io {
            path: err.path().map_or_else(|| dir.to_path_buf(), Path::to_path_buf),
            source: err.into(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_fixture = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.ends_with(FIXTURE_SUFFIX));
        if !is_fixture {
            continue;
        }
        let relative = entry.path().strip_prefix(dir).unwrap_or(entry.path());
        found.push((FixturePath::from_relative(relative), entry.into_path()));
    }
    found.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(found)
}

fn read_fixture(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}
