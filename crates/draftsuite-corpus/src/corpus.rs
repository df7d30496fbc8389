//! Corpus root and directory convention.
//!
//! ```text
//! <root>/tests/draft<N>/**/*.json   test groups
//! <root>/remotes/**/*.json          remote reference documents
//! ```

use std::path::{Path, PathBuf};

use crate::draft::Draft;

/// Subdirectory holding one directory per draft.
pub const TESTS_DIR: &str = "tests";

/// Subdirectory holding remote reference documents.
pub const REMOTES_DIR: &str = "remotes";

/// Resolve the corpus subtree for `draft`. Pure path arithmetic.
#[must_use]
pub fn draft_subtree(root: &Path, draft: Draft) -> PathBuf {
    root.join(TESTS_DIR).join(draft.dir_name())
}

/// An explicitly located conformance corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Corpus {
    root: PathBuf,
}

impl Corpus {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn draft_dir(&self, draft: Draft) -> PathBuf {
        draft_subtree(&self.root, draft)
    }

    #[must_use]
    pub fn remotes_dir(&self) -> PathBuf {
        self.root.join(REMOTES_DIR)
    }

    /// Drafts with a `draft<N>` directory present on disk, ascending.
    pub fn available_drafts(&self) -> std::io::Result<Vec<Draft>> {
        let tests = self.root.join(TESTS_DIR);
        let mut drafts = Vec::new();
        for entry in std::fs::read_dir(&tests)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            // Only the exact `draft<N>` spelling maps back to a subtree.
            if let Some(draft) = Draft::from_str_loose(name)
                && draft.dir_name() == name
            {
                drafts.push(draft);
            }
        }
        drafts.sort();
        Ok(drafts)
    }
}
