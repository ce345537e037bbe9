use std::collections::HashSet;
use std::sync::Arc;

use facet_future::LazyFuture;
use facet_types::{ManifestId, ObjectId, RootId};

use crate::error::StoreResult;
use crate::object::{Blob, BlobMetadata, Tree, TreeEntry, TreeEntryKind};

/// Answer of an id-level equality check that avoids fetching contents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectComparison {
    /// The ids are known to name the same object.
    Identical,
    /// The ids are known to name different objects.
    Different,
    /// Equality cannot be decided from the ids alone; the caller must
    /// re-materialize to be sure.
    Unknown,
}

/// Where a fetched object came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectOrigin {
    /// Served from an in-memory cache.
    Memory,
    /// Served from local disk.
    Disk,
    /// Fetched over the network.
    Remote,
}

/// Result of [`BackingStore::get_root_tree`].
#[derive(Clone, Debug)]
pub struct RootTreeResult {
    /// The materialized root tree.
    pub tree: Arc<Tree>,
    /// The id under which the tree can be re-fetched.
    pub tree_id: ObjectId,
}

/// Result of [`BackingStore::get_tree`].
#[derive(Clone, Debug)]
pub struct TreeResult {
    /// The materialized tree.
    pub tree: Arc<Tree>,
    /// Where the tree came from.
    pub origin: ObjectOrigin,
}

/// Result of [`BackingStore::get_blob`].
#[derive(Clone, Debug)]
pub struct BlobResult {
    /// The blob content.
    pub blob: Blob,
    /// Where the blob came from.
    pub origin: ObjectOrigin,
}

/// Result of [`BackingStore::get_blob_metadata`].
#[derive(Clone, Copy, Debug)]
pub struct BlobMetadataResult {
    /// Size and content hash.
    pub metadata: BlobMetadata,
    /// Where the metadata came from.
    pub origin: ObjectOrigin,
}

/// A content-addressed provider of source-control objects.
///
/// Fetching operations return [`LazyFuture`]s: they may suspend on I/O, and
/// dropping the returned future abandons the work cooperatively.
/// [`compare_objects_by_id`], id parsing/rendering, and the housekeeping
/// operations are synchronous.
///
/// Implementations must be safe for concurrent reads.
///
/// [`compare_objects_by_id`]: BackingStore::compare_objects_by_id
pub trait BackingStore: Send + Sync {
    /// Fetch and materialize the tree a root id points at.
    fn get_root_tree(&self, root_id: &RootId) -> LazyFuture<StoreResult<RootTreeResult>>;

    /// Fetch a tree by object id.
    fn get_tree(&self, id: &ObjectId) -> LazyFuture<StoreResult<TreeResult>>;

    /// Fetch a blob's content by object id.
    fn get_blob(&self, id: &ObjectId) -> LazyFuture<StoreResult<BlobResult>>;

    /// Fetch a blob's metadata without its content.
    fn get_blob_metadata(&self, id: &ObjectId) -> LazyFuture<StoreResult<BlobMetadataResult>>;

    /// Build the tree entry an object id would occupy, given its kind.
    fn get_tree_entry_for_object_id(
        &self,
        id: &ObjectId,
        kind: TreeEntryKind,
    ) -> LazyFuture<StoreResult<TreeEntry>>;

    /// Hint that the given blobs will be read soon.
    fn prefetch_blobs(&self, ids: &[ObjectId]) -> LazyFuture<StoreResult<()>>;

    /// Compare two object ids without fetching contents.
    ///
    /// Never suspends: when the answer depends on state that is not already
    /// available, implementations return [`ObjectComparison::Unknown`].
    fn compare_objects_by_id(&self, a: &ObjectId, b: &ObjectId) -> StoreResult<ObjectComparison>;

    /// Parse an externally supplied root id.
    fn parse_root_id(&self, bytes: &[u8]) -> StoreResult<RootId>;

    /// Render a root id for external use.
    fn render_root_id(&self, root_id: &RootId) -> StoreResult<Vec<u8>>;

    /// Parse an externally supplied object id.
    fn parse_object_id(&self, bytes: &[u8]) -> StoreResult<ObjectId>;

    /// Render an object id for external use.
    fn render_object_id(&self, id: &ObjectId) -> StoreResult<Vec<u8>>;

    /// Import a manifest for the given root ahead of materialization.
    fn import_manifest_for_root(
        &self,
        root_id: &RootId,
        manifest: &ManifestId,
    ) -> LazyFuture<StoreResult<()>>;

    /// Human-readable repository name, if the store knows one.
    fn get_repo_name(&self) -> Option<String>;

    /// Begin recording which objects are fetched.
    fn start_recording_fetch(&self);

    /// Stop recording and return the keys of the objects fetched while
    /// recording was active.
    fn stop_recording_fetch(&self) -> HashSet<String>;

    /// Give the store a chance to run periodic maintenance.
    fn periodic_management_task(&self);
}
