use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use facet_future::LazyFuture;
use facet_types::{ManifestId, ObjectId, RootId};

use crate::error::{StoreError, StoreResult};
use crate::object::{Blob, Tree, TreeEntry, TreeEntryKind};
use crate::traits::{
    BackingStore, BlobMetadataResult, BlobResult, ObjectComparison, ObjectOrigin, RootTreeResult,
    TreeResult,
};

/// In-memory, HashMap-based backing store.
///
/// Intended for tests and embedding. Objects are content-addressed with a
/// kind-tagged BLAKE3 hash; root ids map to tree ids through an explicit
/// registry. Every fetch completes synchronously, so the returned futures are
/// always ready.
///
/// Id parsing and rendering treat the bytes as opaque: any byte string is a
/// valid id for this store.
pub struct InMemoryBackingStore {
    repo_name: Option<String>,
    shelves: RwLock<Shelves>,
    recording: Mutex<Option<HashSet<String>>>,
    management_runs: AtomicU64,
}

#[derive(Default)]
struct Shelves {
    trees: HashMap<ObjectId, Arc<Tree>>,
    blobs: HashMap<ObjectId, Blob>,
    roots: HashMap<RootId, ObjectId>,
    manifests: HashMap<RootId, ManifestId>,
}

impl InMemoryBackingStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            repo_name: None,
            shelves: RwLock::new(Shelves::default()),
            recording: Mutex::new(None),
            management_runs: AtomicU64::new(0),
        }
    }

    /// Create a new empty store that reports the given repository name.
    pub fn with_repo_name(name: impl Into<String>) -> Self {
        Self {
            repo_name: Some(name.into()),
            ..Self::new()
        }
    }

    /// Store a blob, returning its content-addressed id.
    pub fn put_blob(&self, data: &[u8]) -> ObjectId {
        let id = content_id(b"blob", data);
        let mut shelves = self.shelves.write().expect("lock poisoned");
        shelves.blobs.entry(id.clone()).or_insert_with(|| Blob::new(data.to_vec()));
        id
    }

    /// Store a tree, returning its content-addressed id.
    pub fn put_tree(&self, tree: Tree) -> StoreResult<ObjectId> {
        let encoded =
            serde_json::to_vec(&tree).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let id = content_id(b"tree", &encoded);
        let mut shelves = self.shelves.write().expect("lock poisoned");
        shelves.trees.entry(id.clone()).or_insert_with(|| Arc::new(tree));
        Ok(id)
    }

    /// Register a root id as pointing at the given tree.
    pub fn set_root(&self, root_id: RootId, tree_id: ObjectId) {
        let mut shelves = self.shelves.write().expect("lock poisoned");
        shelves.roots.insert(root_id, tree_id);
    }

    /// The manifest last imported for a root, if any.
    pub fn imported_manifest(&self, root_id: &RootId) -> Option<ManifestId> {
        let shelves = self.shelves.read().expect("lock poisoned");
        shelves.manifests.get(root_id).copied()
    }

    /// How many times `periodic_management_task` has run.
    pub fn management_runs(&self) -> u64 {
        self.management_runs.load(Ordering::SeqCst)
    }

    fn record(&self, id: &ObjectId) {
        let mut recording = self.recording.lock().expect("lock poisoned");
        if let Some(fetched) = recording.as_mut() {
            fetched.insert(id.to_hex());
        }
    }
}

impl Default for InMemoryBackingStore {
    fn default() -> Self {
        Self::new()
    }
}

fn content_id(kind: &[u8], data: &[u8]) -> ObjectId {
    let mut hasher = blake3::Hasher::new();
    hasher.update(kind);
    hasher.update(&[0]);
    hasher.update(data);
    ObjectId::new(hasher.finalize().as_bytes().to_vec())
}

impl BackingStore for InMemoryBackingStore {
    fn get_root_tree(&self, root_id: &RootId) -> LazyFuture<StoreResult<RootTreeResult>> {
        let shelves = self.shelves.read().expect("lock poisoned");
        let result = match shelves.roots.get(root_id) {
            Some(tree_id) => match shelves.trees.get(tree_id) {
                Some(tree) => {
                    self.record(tree_id);
                    Ok(RootTreeResult {
                        tree: Arc::clone(tree),
                        tree_id: tree_id.clone(),
                    })
                }
                None => Err(StoreError::NotFound(tree_id.clone())),
            },
            None => Err(StoreError::UnknownRoot(root_id.clone())),
        };
        LazyFuture::ready(result)
    }

    fn get_tree(&self, id: &ObjectId) -> LazyFuture<StoreResult<TreeResult>> {
        let shelves = self.shelves.read().expect("lock poisoned");
        let result = match shelves.trees.get(id) {
            Some(tree) => {
                self.record(id);
                Ok(TreeResult {
                    tree: Arc::clone(tree),
                    origin: ObjectOrigin::Memory,
                })
            }
            None => Err(StoreError::NotFound(id.clone())),
        };
        LazyFuture::ready(result)
    }

    fn get_blob(&self, id: &ObjectId) -> LazyFuture<StoreResult<BlobResult>> {
        let shelves = self.shelves.read().expect("lock poisoned");
        let result = match shelves.blobs.get(id) {
            Some(blob) => {
                self.record(id);
                Ok(BlobResult {
                    blob: blob.clone(),
                    origin: ObjectOrigin::Memory,
                })
            }
            None => Err(StoreError::NotFound(id.clone())),
        };
        LazyFuture::ready(result)
    }

    fn get_blob_metadata(&self, id: &ObjectId) -> LazyFuture<StoreResult<BlobMetadataResult>> {
        let shelves = self.shelves.read().expect("lock poisoned");
        let result = match shelves.blobs.get(id) {
            Some(blob) => {
                self.record(id);
                Ok(BlobMetadataResult {
                    metadata: blob.metadata(),
                    origin: ObjectOrigin::Memory,
                })
            }
            None => Err(StoreError::NotFound(id.clone())),
        };
        LazyFuture::ready(result)
    }

    fn get_tree_entry_for_object_id(
        &self,
        id: &ObjectId,
        kind: TreeEntryKind,
    ) -> LazyFuture<StoreResult<TreeEntry>> {
        let shelves = self.shelves.read().expect("lock poisoned");
        let known = shelves.blobs.contains_key(id) || shelves.trees.contains_key(id);
        let result = if known {
            self.record(id);
            Ok(TreeEntry::new(id.clone(), kind))
        } else {
            Err(StoreError::NotFound(id.clone()))
        };
        LazyFuture::ready(result)
    }

    fn prefetch_blobs(&self, ids: &[ObjectId]) -> LazyFuture<StoreResult<()>> {
        for id in ids {
            self.record(id);
        }
        LazyFuture::ready(Ok(()))
    }

    fn compare_objects_by_id(&self, a: &ObjectId, b: &ObjectId) -> StoreResult<ObjectComparison> {
        // Content addressing: equal bytes name equal objects, different
        // bytes name different objects.
        if a == b {
            Ok(ObjectComparison::Identical)
        } else {
            Ok(ObjectComparison::Different)
        }
    }

    fn parse_root_id(&self, bytes: &[u8]) -> StoreResult<RootId> {
        Ok(RootId::new(bytes.to_vec()))
    }

    fn render_root_id(&self, root_id: &RootId) -> StoreResult<Vec<u8>> {
        Ok(root_id.as_bytes().to_vec())
    }

    fn parse_object_id(&self, bytes: &[u8]) -> StoreResult<ObjectId> {
        Ok(ObjectId::new(bytes.to_vec()))
    }

    fn render_object_id(&self, id: &ObjectId) -> StoreResult<Vec<u8>> {
        Ok(id.as_bytes().to_vec())
    }

    fn import_manifest_for_root(
        &self,
        root_id: &RootId,
        manifest: &ManifestId,
    ) -> LazyFuture<StoreResult<()>> {
        let mut shelves = self.shelves.write().expect("lock poisoned");
        shelves.manifests.insert(root_id.clone(), *manifest);
        LazyFuture::ready(Ok(()))
    }

    fn get_repo_name(&self) -> Option<String> {
        self.repo_name.clone()
    }

    fn start_recording_fetch(&self) {
        let mut recording = self.recording.lock().expect("lock poisoned");
        recording.get_or_insert_with(HashSet::new);
    }

    fn stop_recording_fetch(&self) -> HashSet<String> {
        let mut recording = self.recording.lock().expect("lock poisoned");
        recording.take().unwrap_or_default()
    }

    fn periodic_management_task(&self) {
        self.management_runs.fetch_add(1, Ordering::SeqCst);
    }
}

impl std::fmt::Debug for InMemoryBackingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shelves = self.shelves.read().expect("lock poisoned");
        f.debug_struct("InMemoryBackingStore")
            .field("trees", &shelves.trees.len())
            .field("blobs", &shelves.blobs.len())
            .field("roots", &shelves.roots.len())
            .finish()
    }
}
