use std::collections::HashMap;

use facet_future::LazyFuture;
use facet_types::{FilterId, RepoPath};

use crate::error::FilterResult;
use crate::traits::PathFilter;

/// Rule-set filter: each filter id names a list of hidden paths.
///
/// A path is hidden when it equals a listed path or lies beneath one, so
/// listing a directory hides its whole subtree. Unknown filter ids (including
/// the empty one) hide nothing. Lookups always complete synchronously.
///
/// Intended for tests and embedding; a production deployment supplies its own
/// [`PathFilter`] over whatever rule language it uses.
#[derive(Debug, Default)]
pub struct RuleSetFilter {
    sets: HashMap<FilterId, Vec<RepoPath>>,
}

impl RuleSetFilter {
    /// Create a filter with no rule sets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the paths hidden under `filter_id`, replacing any previous
    /// set for that id.
    pub fn hide(&mut self, filter_id: FilterId, paths: Vec<RepoPath>) -> &mut Self {
        self.sets.insert(filter_id, paths);
        self
    }

    /// Number of registered filter ids.
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    /// Returns `true` if no rule sets are registered.
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    fn hides(&self, path: &RepoPath, filter_id: &FilterId) -> bool {
        self.sets
            .get(filter_id)
            .is_some_and(|hidden| hidden.iter().any(|rule| rule.contains(path)))
    }
}

impl PathFilter for RuleSetFilter {
    fn is_path_filtered(
        &self,
        path: RepoPath,
        filter_id: &FilterId,
    ) -> LazyFuture<FilterResult<bool>> {
        LazyFuture::ready(Ok(self.hides(&path, filter_id)))
    }
}
