use facet_future::LazyFuture;
use facet_types::{FilterId, RepoPath};

use crate::error::FilterResult;

/// Decides which paths a view may see.
///
/// `true` means the path is hidden. Implementations must be safe to call
/// concurrently for independent `(path, filter_id)` pairs and may complete
/// synchronously; callers rely on that for their own non-suspending fast
/// paths. The path is taken by value so its ownership moves into the lookup
/// and outlives any deferred work.
pub trait PathFilter: Send + Sync {
    /// Is `path` hidden under the filter configuration named `filter_id`?
    fn is_path_filtered(&self, path: RepoPath, filter_id: &FilterId)
        -> LazyFuture<FilterResult<bool>>;
}
