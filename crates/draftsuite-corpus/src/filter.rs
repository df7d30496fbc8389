//! Path filters applied to fixture files before they are loaded.

use glob::{MatchOptions, Pattern};

use crate::group::FixturePath;

/// Failure raised by a caller-supplied filter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct FilterError {
    message: String,
}

impl FilterError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Predicate narrowing which fixture files a load includes.
pub trait GroupFilter {
    /// Returns `Ok(true)` to keep the file at `path`.
    fn accepts(&self, path: &FixturePath) -> Result<bool, FilterError>;
}

impl<F> GroupFilter for F
where
    F: Fn(&FixturePath) -> Result<bool, FilterError>,
{
    fn accepts(&self, path: &FixturePath) -> Result<bool, FilterError> {
        self(path)
    }
}

/// Accepts a path only when every member filter accepts it.
///
/// An empty chain accepts everything.
#[derive(Default)]
pub struct FilterChain<'a> {
    filters: Vec<&'a dyn GroupFilter>,
}

impl<'a> FilterChain<'a> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, filter: &'a dyn GroupFilter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Append `filter` when present.
    #[must_use]
    pub fn with_opt(self, filter: Option<&'a dyn GroupFilter>) -> Self {
        match filter {
            Some(filter) => self.with(filter),
            None => self,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl GroupFilter for FilterChain<'_> {
    fn accepts(&self, path: &FixturePath) -> Result<bool, FilterError> {
        for filter in &self.filters {
            if !filter.accepts(path)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// `*` stays inside one path segment; `**` spans segments.
pub const PATH_MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Include/exclude glob selection over relative fixture paths.
///
/// Patterns are matched against [`FixturePath::as_str`] (extension kept),
/// e.g. `optional/**` or `ref*.json`. With no include patterns every path
/// is a candidate; exclusions always win.
#[derive(Debug, Clone, Default)]
pub struct PathSelector {
    include_patterns: Vec<Pattern>,
    exclude_patterns: Vec<Pattern>,
}

impl PathSelector {
    /// Compile include/exclude patterns. Returns the first invalid pattern.
    pub fn new(includes: &[String], excludes: &[String]) -> Result<Self, glob::PatternError> {
        let include_patterns = includes
            .iter()
            .map(|p| Pattern::new(p.as_str()))
            .collect::<Result<Vec<_>, _>>()?;
        let exclude_patterns = excludes
            .iter()
            .map(|p| Pattern::new(p.as_str()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            include_patterns,
            exclude_patterns,
        })
    }

    /// Selector that only excludes paths matching `pattern`.
    pub fn ignoring(pattern: &str) -> Result<Self, glob::PatternError> {
        Self::new(&[], &[pattern.to_string()])
    }

    #[must_use]
    pub fn selects(&self, path: &FixturePath) -> bool {
        let p = path.as_str();
        let included = self.include_patterns.is_empty()
            || self
                .include_patterns
                .iter()
                .any(|pat| pat.matches_with(p, PATH_MATCH_OPTIONS));
        included
            && !self
                .exclude_patterns
                .iter()
                .any(|pat| pat.matches_with(p, PATH_MATCH_OPTIONS))
    }
}

impl GroupFilter for PathSelector {
    fn accepts(&self, path: &FixturePath) -> Result<bool, FilterError> {
        Ok(self.selects(path))
    }
}
