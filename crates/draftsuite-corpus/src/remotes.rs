//! Remote reference documents.
//!
//! Schemas in the corpus reference documents such as
//! `http://localhost:1234/integer.json`. Those are never fetched; the
//! documents under `<root>/remotes/` are loaded up front and handed to the
//! validator keyed by their synthetic URI.

use crate::corpus::Corpus;
use crate::group::FixturePath;
use crate::loader::{LoadError, discover_fixture_files};

/// Base URI the corpus uses for remote references.
pub const DEFAULT_REMOTE_BASE: &str = "http://localhost:1234/";

/// One remote document and the URI it is served at.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteDocument {
    pub uri: String,
    pub path: FixturePath,
    pub document: serde_json::Value,
}

/// All remote documents of a corpus, ordered by path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteSet {
    documents: Vec<RemoteDocument>,
}

impl RemoteSet {
    /// Load every `*.json` under `<root>/remotes/`, served below `base_uri`.
    ///
    /// A corpus without a remotes directory yields an empty set.
    pub fn load(corpus: &Corpus, base_uri: &str) -> Result<Self, LoadError> {
        let dir = corpus.remotes_dir();
        if !dir.is_dir() {
            return Ok(Self::default());
        }
        let base = base_uri.trim_end_matches('/');
        let mut documents = Vec::new();
        for (path, full) in discover_fixture_files(&dir)? {
            let content = std::fs::read_to_string(&full).map_err(|source| LoadError::Io {
                path: full.clone(),
                source,
            })?;
            let document = serde_json::from_str(&content).map_err(|source| {
                LoadError::MalformedFixture {
                    path: full.clone(),
                    source,
                }
            })?;
            documents.push(RemoteDocument {
                uri: format!("{base}/{path}"),
                path,
                document,
            });
        }
        Ok(Self { documents })
    }

    #[must_use]
    pub fn get(&self, uri: &str) -> Option<&serde_json::Value> {
        self.documents
            .iter()
            .find(|doc| doc.uri == uri)
            .map(|doc| &doc.document)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RemoteDocument> {
        self.documents.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
