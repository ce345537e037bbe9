//! A backing store that shows another store through a filter.
//!
//! [`FilteredBackingStore`] decorates an inner [`BackingStore`]: every id it
//! hands out is a [`FilteredObjectId`] or filtered root id, every tree it
//! returns has been run through the view's filter, and every id it receives
//! is decoded back to the inner store's form before forwarding. Blob access
//! is filter-transparent, since blob contents are opaque bytes.

use std::collections::HashSet;
use std::sync::Arc;

use facet_filter::PathFilter;
use facet_future::{collect_all, LazyFuture};
use facet_store::{
    BackingStore, BlobMetadataResult, BlobResult, ObjectComparison, RootTreeResult, StoreError,
    StoreResult, Tree, TreeEntry, TreeEntryKind, TreeResult,
};
use facet_types::{FilterId, ManifestId, ObjectId, RepoPath, RootId};
use tracing::{error, trace};

use crate::object_id::{FilteredObjectId, FilteredObjectType};
use crate::root_id::{create_filtered_root_id, parse_filter_id_from_root_id};

/// A filtered view over an inner backing store.
///
/// The view shares ownership of the inner store and exclusively owns its
/// filter; no handle to the filter escapes. The view itself holds no mutable
/// state: every operation is a pure function of its inputs plus whatever the
/// inner store and filter maintain.
pub struct FilteredBackingStore {
    inner: Arc<dyn BackingStore>,
    filter: Arc<dyn PathFilter>,
}

impl FilteredBackingStore {
    /// Build a view over `inner` governed by `filter`.
    pub fn new(inner: Arc<dyn BackingStore>, filter: Box<dyn PathFilter>) -> Self {
        Self {
            inner,
            filter: Arc::from(filter),
        }
    }

    /// Is the visibility of a path different under two filters?
    ///
    /// Answers `true` when the path is hidden under exactly one of the two
    /// filters. Stays ready when both filter lookups complete synchronously;
    /// fails with [`StoreError::FilterEvaluationFailed`] if either lookup
    /// fails.
    pub fn path_affected_by_filter_change(
        &self,
        path_one: RepoPath,
        path_two: RepoPath,
        filter_one: &FilterId,
        filter_two: &FilterId,
    ) -> LazyFuture<StoreResult<bool>> {
        let lookups = vec![
            self.filter.is_path_filtered(path_one, filter_one),
            self.filter.is_path_filtered(path_two, filter_two),
        ];
        collect_all(lookups).map(|mut verdicts| {
            let two = verdicts.pop();
            let one = verdicts.pop();
            match (one, two) {
                (Some(one), Some(two)) => {
                    let one =
                        one.map_err(|e| StoreError::FilterEvaluationFailed(e.to_string()))?;
                    let two =
                        two.map_err(|e| StoreError::FilterEvaluationFailed(e.to_string()))?;
                    Ok(one != two)
                }
                _ => Err(StoreError::FilterEvaluationFailed(
                    "filter lookup pair lost a result".to_string(),
                )),
            }
        })
    }
}

/// Re-materialize a tree as the filter allows it to be seen.
///
/// All per-entry lookups are launched before any is awaited; their relative
/// order is unspecified. A lookup failure hides the entry: the failure is
/// logged and the entry dropped from the output. Visible subtree entries get
/// ids carrying the entry's full path and the filter id, so the filter
/// propagates to later accesses; every other kind gets a plain blob id. The
/// output preserves the input's case sensitivity, even when empty.
fn filter_tree(
    filter: &dyn PathFilter,
    tree: &Tree,
    tree_path: &RepoPath,
    filter_id: &FilterId,
) -> LazyFuture<Tree> {
    let case_sensitivity = tree.case_sensitivity();
    let mut checks = Vec::with_capacity(tree.len());
    for (name, entry) in tree.iter() {
        let entry_path = tree_path.join(name);
        let name = name.clone();
        let entry = entry.clone();
        let check = filter
            .is_path_filtered(entry_path.clone(), filter_id)
            .map(move |verdict| (name, entry, entry_path, verdict));
        checks.push(check);
    }
    let filter_id = filter_id.clone();
    collect_all(checks).map(move |verdicts| {
        let mut visible = Vec::with_capacity(verdicts.len());
        for (name, entry, entry_path, verdict) in verdicts {
            let hidden = match verdict {
                Ok(hidden) => hidden,
                Err(err) => {
                    error!(
                        path = %entry_path,
                        error = %err,
                        "dropping tree entry after failed filter lookup"
                    );
                    continue;
                }
            };
            if hidden {
                continue;
            }
            let id = if entry.kind.is_tree() {
                FilteredObjectId::tree(entry_path, filter_id.clone(), entry.id).to_object_id()
            } else {
                FilteredObjectId::blob(entry.id).to_object_id()
            };
            visible.push((name, TreeEntry::new(id, entry.kind)));
        }
        Tree::new(visible, case_sensitivity)
    })
}

impl BackingStore for FilteredBackingStore {
    fn get_root_tree(&self, root_id: &RootId) -> LazyFuture<StoreResult<RootTreeResult>> {
        let (inner_root, filter_id) = match parse_filter_id_from_root_id(root_id) {
            Ok(parts) => parts,
            Err(err) => return LazyFuture::ready(Err(err)),
        };
        trace!(root = %inner_root, filter = %filter_id, "fetching root tree");
        let inner = Arc::clone(&self.inner);
        let filter = Arc::clone(&self.filter);
        LazyFuture::deferred(async move {
            let fetched = inner.get_root_tree(&inner_root).await?;
            let filtered =
                filter_tree(filter.as_ref(), &fetched.tree, &RepoPath::root(), &filter_id).await;
            let tree_id = FilteredObjectId::tree(RepoPath::root(), filter_id, fetched.tree_id)
                .to_object_id();
            Ok(RootTreeResult {
                tree: Arc::new(filtered),
                tree_id,
            })
        })
    }

    fn get_tree(&self, id: &ObjectId) -> LazyFuture<StoreResult<TreeResult>> {
        let foid = match FilteredObjectId::from_object_id(id) {
            Ok(foid) => foid,
            Err(err) => return LazyFuture::ready(Err(err)),
        };
        let (path, filter_id) = match (foid.path(), foid.filter()) {
            (Ok(path), Ok(filter_id)) => (path.clone(), filter_id.clone()),
            (Err(err), _) | (_, Err(err)) => return LazyFuture::ready(Err(err)),
        };
        let inner_id = foid.into_object();
        let inner = Arc::clone(&self.inner);
        let filter = Arc::clone(&self.filter);
        LazyFuture::deferred(async move {
            let fetched = inner.get_tree(&inner_id).await?;
            let filtered = filter_tree(filter.as_ref(), &fetched.tree, &path, &filter_id).await;
            Ok(TreeResult {
                tree: Arc::new(filtered),
                origin: fetched.origin,
            })
        })
    }

    fn get_blob(&self, id: &ObjectId) -> LazyFuture<StoreResult<BlobResult>> {
        match FilteredObjectId::from_object_id(id) {
            Ok(foid) => self.inner.get_blob(foid.object()),
            Err(err) => LazyFuture::ready(Err(err)),
        }
    }

    fn get_blob_metadata(&self, id: &ObjectId) -> LazyFuture<StoreResult<BlobMetadataResult>> {
        match FilteredObjectId::from_object_id(id) {
            Ok(foid) => self.inner.get_blob_metadata(foid.object()),
            Err(err) => LazyFuture::ready(Err(err)),
        }
    }

    fn get_tree_entry_for_object_id(
        &self,
        id: &ObjectId,
        kind: TreeEntryKind,
    ) -> LazyFuture<StoreResult<TreeEntry>> {
        match FilteredObjectId::from_object_id(id) {
            Ok(foid) => self.inner.get_tree_entry_for_object_id(foid.object(), kind),
            Err(err) => LazyFuture::ready(Err(err)),
        }
    }

    fn prefetch_blobs(&self, ids: &[ObjectId]) -> LazyFuture<StoreResult<()>> {
        let mut inner_ids = Vec::with_capacity(ids.len());
        for id in ids {
            match FilteredObjectId::from_object_id(id) {
                Ok(foid) => inner_ids.push(foid.into_object()),
                Err(err) => return LazyFuture::ready(Err(err)),
            }
        }
        self.inner.prefetch_blobs(&inner_ids)
    }

    /// Compare two filtered ids without fetching contents and without
    /// suspending.
    ///
    /// When the two ids carry different filters, the answer depends on
    /// whether the filter change affects this path. If that cannot be
    /// decided synchronously the verdict is `Unknown`; and even when the
    /// path itself is unaffected, an inner `Identical` is downgraded to
    /// `Unknown`, because a descendant may still be affected.
    fn compare_objects_by_id(
        &self,
        one: &ObjectId,
        two: &ObjectId,
    ) -> StoreResult<ObjectComparison> {
        // Byte-equal ids carry the same filter and must be equal.
        if one == two {
            return Ok(ObjectComparison::Identical);
        }

        let one = FilteredObjectId::from_object_id(one)?;
        let two = FilteredObjectId::from_object_id(two)?;
        if one.object_type() != two.object_type() {
            return Err(StoreError::InvalidCompare {
                left: one.object_type().to_string(),
                right: two.object_type().to_string(),
            });
        }

        match one.object_type() {
            FilteredObjectType::Blob => {
                self.inner.compare_objects_by_id(one.object(), two.object())
            }
            FilteredObjectType::Tree => {
                if one.filter()? == two.filter()? {
                    return self.inner.compare_objects_by_id(one.object(), two.object());
                }
                let affected = self.path_affected_by_filter_change(
                    one.path()?.clone(),
                    two.path()?.clone(),
                    one.filter()?,
                    two.filter()?,
                );
                match affected.now() {
                    Ok(Ok(true)) => Ok(ObjectComparison::Different),
                    Ok(Ok(false)) => {
                        match self.inner.compare_objects_by_id(one.object(), two.object())? {
                            ObjectComparison::Identical => Ok(ObjectComparison::Unknown),
                            verdict => Ok(verdict),
                        }
                    }
                    Ok(Err(err)) => Err(err),
                    Err(_pending) => Ok(ObjectComparison::Unknown),
                }
            }
        }
    }

    fn parse_root_id(&self, bytes: &[u8]) -> StoreResult<RootId> {
        let supplied = RootId::new(bytes.to_vec());
        let (inner_root, filter_id) = parse_filter_id_from_root_id(&supplied)?;
        let parsed = self.inner.parse_root_id(inner_root.as_bytes())?;
        trace!(root = %parsed, filter = %filter_id, "parsed root id through inner store");
        Ok(create_filtered_root_id(parsed.as_bytes(), &filter_id))
    }

    fn render_root_id(&self, root_id: &RootId) -> StoreResult<Vec<u8>> {
        let (inner_root, filter_id) = parse_filter_id_from_root_id(root_id)?;
        Ok(create_filtered_root_id(inner_root.as_bytes(), &filter_id).into_bytes())
    }

    fn parse_object_id(&self, bytes: &[u8]) -> StoreResult<ObjectId> {
        self.inner.parse_object_id(bytes)
    }

    fn render_object_id(&self, id: &ObjectId) -> StoreResult<Vec<u8>> {
        self.inner.render_object_id(id)
    }

    /// Import a manifest for the root named by `root_id`.
    ///
    /// The filter id embedded in `root_id` is discarded without error:
    /// manifests describe the unfiltered repository, so the import is
    /// forwarded under the inner root id alone.
    fn import_manifest_for_root(
        &self,
        root_id: &RootId,
        manifest: &ManifestId,
    ) -> LazyFuture<StoreResult<()>> {
        match parse_filter_id_from_root_id(root_id) {
            Ok((inner_root, _filter_id)) => {
                self.inner.import_manifest_for_root(&inner_root, manifest)
            }
            Err(err) => LazyFuture::ready(Err(err)),
        }
    }

    fn get_repo_name(&self) -> Option<String> {
        self.inner.get_repo_name()
    }

    fn start_recording_fetch(&self) {
        self.inner.start_recording_fetch();
    }

    fn stop_recording_fetch(&self) -> HashSet<String> {
        self.inner.stop_recording_fetch()
    }

    fn periodic_management_task(&self) {
        self.inner.periodic_management_task();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_filter::{FilterError, FilterResult, RuleSetFilter};
    use facet_store::{CaseSensitivity, InMemoryBackingStore};
    use facet_types::PathComponent;

    fn comp(name: &str) -> PathComponent {
        PathComponent::new(name).unwrap()
    }

    fn path(s: &str) -> RepoPath {
        RepoPath::parse(s).unwrap()
    }

    fn fid(s: &str) -> FilterId {
        FilterId::from(s)
    }

    /// Inner fixture:
    ///
    /// ```text
    /// (root)
    /// ├── a.txt            blob "alpha"
    /// ├── b.txt            blob "bravo"
    /// └── sub/             tree
    ///     ├── kept.txt     blob "kept"
    ///     └── nested.txt   blob "nested"
    /// ```
    struct Fixture {
        store: Arc<InMemoryBackingStore>,
        inner_root: RootId,
        inner_root_tree_id: ObjectId,
        inner_sub_tree_id: ObjectId,
        inner_a_id: ObjectId,
        inner_b_id: ObjectId,
    }

    fn fixture() -> Fixture {
        fixture_with_case(CaseSensitivity::Sensitive)
    }

    fn fixture_with_case(case: CaseSensitivity) -> Fixture {
        let store = Arc::new(InMemoryBackingStore::new());
        let kept_id = store.put_blob(b"kept");
        let nested_id = store.put_blob(b"nested");
        let sub_tree = Tree::new(
            vec![
                (comp("kept.txt"), TreeEntry::new(kept_id, TreeEntryKind::Regular)),
                (comp("nested.txt"), TreeEntry::new(nested_id, TreeEntryKind::Regular)),
            ],
            case,
        );
        let inner_sub_tree_id = store.put_tree(sub_tree).unwrap();

        let inner_a_id = store.put_blob(b"alpha");
        let inner_b_id = store.put_blob(b"bravo");
        let root_tree = Tree::new(
            vec![
                (comp("a.txt"), TreeEntry::new(inner_a_id.clone(), TreeEntryKind::Regular)),
                (comp("b.txt"), TreeEntry::new(inner_b_id.clone(), TreeEntryKind::Regular)),
                (comp("sub"), TreeEntry::new(inner_sub_tree_id.clone(), TreeEntryKind::Tree)),
            ],
            case,
        );
        let inner_root_tree_id = store.put_tree(root_tree).unwrap();
        let inner_root = RootId::new(b"main".to_vec());
        store.set_root(inner_root.clone(), inner_root_tree_id.clone());

        Fixture {
            store,
            inner_root,
            inner_root_tree_id,
            inner_sub_tree_id,
            inner_a_id,
            inner_b_id,
        }
    }

    fn view(fx: &Fixture, filter: RuleSetFilter) -> FilteredBackingStore {
        FilteredBackingStore::new(Arc::clone(&fx.store) as Arc<dyn BackingStore>, Box::new(filter))
    }

    fn hide(filter_id: &str, paths: &[&str]) -> RuleSetFilter {
        let mut filter = RuleSetFilter::new();
        filter.hide(fid(filter_id), paths.iter().map(|p| path(p)).collect());
        filter
    }

    fn filtered_root(fx: &Fixture, filter_id: &str) -> RootId {
        create_filtered_root_id(fx.inner_root.as_bytes(), &fid(filter_id))
    }

    fn tree_id(p: &str, filter_id: &str, inner: &ObjectId) -> ObjectId {
        FilteredObjectId::tree(path(p), fid(filter_id), inner.clone()).to_object_id()
    }

    fn blob_id(inner: &ObjectId) -> ObjectId {
        FilteredObjectId::blob(inner.clone()).to_object_id()
    }

    /// A filter whose every lookup stays pending forever.
    struct PendingFilter;

    impl PathFilter for PendingFilter {
        fn is_path_filtered(
            &self,
            _path: RepoPath,
            _filter_id: &FilterId,
        ) -> LazyFuture<FilterResult<bool>> {
            LazyFuture::deferred(std::future::pending())
        }
    }

    /// A filter that fails lookups for one path and allows everything else.
    struct FaultyFilter {
        fail_on: RepoPath,
    }

    impl PathFilter for FaultyFilter {
        fn is_path_filtered(
            &self,
            path: RepoPath,
            _filter_id: &FilterId,
        ) -> LazyFuture<FilterResult<bool>> {
            if path == self.fail_on {
                LazyFuture::ready(Err(FilterError::Evaluation("rule store offline".into())))
            } else {
                LazyFuture::ready(Ok(false))
            }
        }
    }

    // -----------------------------------------------------------------------
    // Root tree materialization
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn root_tree_hides_filtered_entries() {
        let fx = fixture();
        let store = view(&fx, hide("F", &["b.txt"]));

        let result = store.get_root_tree(&filtered_root(&fx, "F")).await.unwrap();
        let names: Vec<_> = result.tree.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "sub"]);
    }

    #[tokio::test]
    async fn root_tree_id_carries_filter_and_empty_path() {
        let fx = fixture();
        let store = view(&fx, hide("F", &["b.txt"]));

        let result = store.get_root_tree(&filtered_root(&fx, "F")).await.unwrap();
        let decoded = FilteredObjectId::from_object_id(&result.tree_id).unwrap();
        assert!(decoded.path().unwrap().is_root());
        assert_eq!(decoded.filter().unwrap(), &fid("F"));
        assert_eq!(decoded.object(), &fx.inner_root_tree_id);
    }

    #[tokio::test]
    async fn root_tree_children_carry_filter_and_path() {
        let fx = fixture();
        let store = view(&fx, hide("F", &["b.txt"]));

        let result = store.get_root_tree(&filtered_root(&fx, "F")).await.unwrap();
        let sub = result.tree.get("sub").unwrap();
        assert_eq!(sub.kind, TreeEntryKind::Tree);
        assert_eq!(sub.id, tree_id("sub", "F", &fx.inner_sub_tree_id));

        let a = result.tree.get("a.txt").unwrap();
        assert_eq!(a.kind, TreeEntryKind::Regular);
        assert_eq!(a.id, blob_id(&fx.inner_a_id));
    }

    #[tokio::test]
    async fn empty_filter_id_hides_nothing() {
        let fx = fixture();
        let store = view(&fx, hide("F", &["b.txt"]));

        let result = store.get_root_tree(&filtered_root(&fx, "")).await.unwrap();
        assert_eq!(result.tree.len(), 3);
    }

    #[tokio::test]
    async fn root_tree_with_malformed_root_id_fails() {
        let fx = fixture();
        let store = view(&fx, RuleSetFilter::new());

        let err = store
            .get_root_tree(&RootId::new(vec![0x80]))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::MalformedRootId(_)));
    }

    #[tokio::test]
    async fn fully_hidden_tree_is_empty_but_keeps_case_sensitivity() {
        let fx = fixture_with_case(CaseSensitivity::Insensitive);
        let store = view(&fx, hide("all", &["a.txt", "b.txt", "sub"]));

        let result = store.get_root_tree(&filtered_root(&fx, "all")).await.unwrap();
        assert!(result.tree.is_empty());
        assert_eq!(result.tree.case_sensitivity(), CaseSensitivity::Insensitive);
    }

    // -----------------------------------------------------------------------
    // Subtree materialization
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn get_tree_applies_embedded_path_and_filter() {
        let fx = fixture();
        let store = view(&fx, hide("F", &["sub/nested.txt"]));

        let root = store.get_root_tree(&filtered_root(&fx, "F")).await.unwrap();
        let sub_id = root.tree.get("sub").unwrap().id.clone();

        let sub = store.get_tree(&sub_id).await.unwrap();
        let names: Vec<_> = sub.tree.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["kept.txt"]);
    }

    #[tokio::test]
    async fn subtree_rule_hides_entries_beneath_it() {
        let fx = fixture();
        let store = view(&fx, hide("F", &["sub"]));

        let root = store.get_root_tree(&filtered_root(&fx, "F")).await.unwrap();
        assert!(root.tree.get("sub").is_none());

        // Fetching the subtree directly under the same filter also hides its
        // children, because their paths fall under the hidden directory.
        let sub = store
            .get_tree(&tree_id("sub", "F", &fx.inner_sub_tree_id))
            .await
            .unwrap();
        assert!(sub.tree.is_empty());
    }

    #[tokio::test]
    async fn get_tree_rejects_blob_ids() {
        let fx = fixture();
        let store = view(&fx, RuleSetFilter::new());

        let err = store.get_tree(&blob_id(&fx.inner_a_id)).await.unwrap_err();
        assert!(matches!(err, StoreError::WrongVariant { field: "path" }));
    }

    #[tokio::test]
    async fn get_tree_rejects_unknown_tags() {
        let fx = fixture();
        let store = view(&fx, RuleSetFilter::new());

        let err = store
            .get_tree(&ObjectId::new(vec![0x7E, 1, 2]))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownObjectType { tag: 0x7E }));
    }

    // -----------------------------------------------------------------------
    // Filter lookup failures during materialization
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn failed_lookup_drops_only_the_affected_entry() {
        let fx = fixture();
        let store = FilteredBackingStore::new(
            Arc::clone(&fx.store) as Arc<dyn BackingStore>,
            Box::new(FaultyFilter {
                fail_on: path("b.txt"),
            }),
        );

        let result = store.get_root_tree(&filtered_root(&fx, "F")).await.unwrap();
        let names: Vec<_> = result.tree.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "sub"]);
    }

    // -----------------------------------------------------------------------
    // Blob transparency
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn get_blob_forwards_the_inner_id() {
        let fx = fixture();
        let store = view(&fx, hide("F", &["a.txt"]));

        // Even a filter that hides the path does not block blob access: blob
        // ids carry no filter and are forwarded as-is.
        let result = store.get_blob(&blob_id(&fx.inner_a_id)).await.unwrap();
        assert_eq!(result.blob.data, b"alpha");
    }

    #[tokio::test]
    async fn get_blob_metadata_forwards_the_inner_id() {
        let fx = fixture();
        let store = view(&fx, RuleSetFilter::new());

        fx.store.start_recording_fetch();
        let result = store
            .get_blob_metadata(&blob_id(&fx.inner_a_id))
            .await
            .unwrap();
        assert_eq!(result.metadata.size, 5);
        let fetched = fx.store.stop_recording_fetch();
        assert_eq!(fetched, HashSet::from([fx.inner_a_id.to_hex()]));
    }

    #[tokio::test]
    async fn get_tree_entry_forwards_the_inner_id() {
        let fx = fixture();
        let store = view(&fx, RuleSetFilter::new());

        let entry = store
            .get_tree_entry_for_object_id(&blob_id(&fx.inner_a_id), TreeEntryKind::Regular)
            .await
            .unwrap();
        assert_eq!(entry.id, fx.inner_a_id);
        assert_eq!(entry.kind, TreeEntryKind::Regular);
    }

    #[tokio::test]
    async fn get_blob_rejects_malformed_ids() {
        let fx = fixture();
        let store = view(&fx, RuleSetFilter::new());

        let err = store.get_blob(&ObjectId::new(Vec::new())).await.unwrap_err();
        assert!(matches!(err, StoreError::MalformedObjectId(_)));
    }

    #[tokio::test]
    async fn prefetch_decodes_every_id() {
        let fx = fixture();
        let store = view(&fx, RuleSetFilter::new());

        fx.store.start_recording_fetch();
        store
            .prefetch_blobs(&[blob_id(&fx.inner_a_id), blob_id(&fx.inner_b_id)])
            .await
            .unwrap();
        let fetched = fx.store.stop_recording_fetch();
        assert_eq!(
            fetched,
            HashSet::from([fx.inner_a_id.to_hex(), fx.inner_b_id.to_hex()])
        );
    }

    #[tokio::test]
    async fn prefetch_fails_on_any_undecodable_id() {
        let fx = fixture();
        let store = view(&fx, RuleSetFilter::new());

        let err = store
            .prefetch_blobs(&[blob_id(&fx.inner_a_id), ObjectId::new(vec![0x7E])])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownObjectType { tag: 0x7E }));
    }

    // -----------------------------------------------------------------------
    // Comparison oracle
    // -----------------------------------------------------------------------

    #[test]
    fn compare_is_reflexive() {
        let fx = fixture();
        let store = view(&fx, hide("F", &["b.txt"]));

        let id = tree_id("sub", "F", &fx.inner_sub_tree_id);
        assert_eq!(
            store.compare_objects_by_id(&id, &id).unwrap(),
            ObjectComparison::Identical
        );
    }

    #[test]
    fn compare_blobs_delegates_to_inner() {
        let fx = fixture();
        let store = view(&fx, RuleSetFilter::new());

        let verdict = store
            .compare_objects_by_id(&blob_id(&fx.inner_a_id), &blob_id(&fx.inner_b_id))
            .unwrap();
        assert_eq!(verdict, ObjectComparison::Different);
    }

    #[test]
    fn compare_trees_with_same_filter_delegates_to_inner() {
        let fx = fixture();
        let store = view(&fx, hide("F", &["b.txt"]));

        let verdict = store
            .compare_objects_by_id(
                &tree_id("sub", "F", &fx.inner_sub_tree_id),
                &tree_id("sub", "F", &fx.inner_root_tree_id),
            )
            .unwrap();
        assert_eq!(verdict, ObjectComparison::Different);
    }

    #[test]
    fn compare_detects_visibility_change() {
        let fx = fixture();
        // F1 hides sub; F2 hides nothing.
        let store = view(&fx, hide("F1", &["sub"]));

        let one = tree_id("sub", "F1", &fx.inner_sub_tree_id);
        let two = tree_id("sub", "F2", &fx.inner_sub_tree_id);
        assert_eq!(
            store.compare_objects_by_id(&one, &two).unwrap(),
            ObjectComparison::Different
        );
        // Symmetric: the same verdict with the arguments swapped.
        assert_eq!(
            store.compare_objects_by_id(&two, &one).unwrap(),
            ObjectComparison::Different
        );
    }

    #[test]
    fn compare_downgrades_inner_identical_to_unknown() {
        let fx = fixture();
        // Neither filter affects the path itself; descendants might differ.
        let store = view(&fx, hide("F1", &["elsewhere"]));

        let one = tree_id("sub", "F1", &fx.inner_sub_tree_id);
        let two = tree_id("sub", "F2", &fx.inner_sub_tree_id);
        assert_eq!(
            store.compare_objects_by_id(&one, &two).unwrap(),
            ObjectComparison::Unknown
        );
        assert_eq!(
            store.compare_objects_by_id(&two, &one).unwrap(),
            ObjectComparison::Unknown
        );
    }

    #[test]
    fn compare_passes_inner_different_through() {
        let fx = fixture();
        let store = view(&fx, RuleSetFilter::new());

        // Different filters, path unaffected by either, different inner ids.
        let one = tree_id("sub", "F1", &fx.inner_sub_tree_id);
        let two = tree_id("sub", "F2", &fx.inner_root_tree_id);
        assert_eq!(
            store.compare_objects_by_id(&one, &two).unwrap(),
            ObjectComparison::Different
        );
    }

    #[test]
    fn compare_rejects_mixed_kinds() {
        let fx = fixture();
        let store = view(&fx, RuleSetFilter::new());

        let err = store
            .compare_objects_by_id(
                &blob_id(&fx.inner_a_id),
                &tree_id("sub", "F", &fx.inner_sub_tree_id),
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidCompare { .. }));
    }

    #[test]
    fn compare_rejects_unknown_tags() {
        let fx = fixture();
        let store = view(&fx, RuleSetFilter::new());

        let err = store
            .compare_objects_by_id(&ObjectId::new(vec![0x7E, 9]), &blob_id(&fx.inner_a_id))
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownObjectType { tag: 0x7E }));
    }

    #[test]
    fn compare_returns_unknown_when_filter_is_slow() {
        let fx = fixture();
        let store = FilteredBackingStore::new(
            Arc::clone(&fx.store) as Arc<dyn BackingStore>,
            Box::new(PendingFilter),
        );

        let one = tree_id("sub", "F1", &fx.inner_sub_tree_id);
        let two = tree_id("sub", "F2", &fx.inner_sub_tree_id);
        assert_eq!(
            store.compare_objects_by_id(&one, &two).unwrap(),
            ObjectComparison::Unknown
        );
    }

    #[test]
    fn compare_surfaces_filter_failures() {
        let fx = fixture();
        let store = FilteredBackingStore::new(
            Arc::clone(&fx.store) as Arc<dyn BackingStore>,
            Box::new(FaultyFilter {
                fail_on: path("sub"),
            }),
        );

        let one = tree_id("sub", "F1", &fx.inner_sub_tree_id);
        let two = tree_id("sub", "F2", &fx.inner_sub_tree_id);
        let err = store.compare_objects_by_id(&one, &two).unwrap_err();
        assert!(matches!(err, StoreError::FilterEvaluationFailed(_)));
    }

    // -----------------------------------------------------------------------
    // path_affected_by_filter_change
    // -----------------------------------------------------------------------

    #[test]
    fn path_affected_when_filters_disagree() {
        let fx = fixture();
        let store = view(&fx, hide("F1", &["doc"]));

        let affected = store
            .path_affected_by_filter_change(path("doc"), path("doc"), &fid("F1"), &fid("F2"))
            .now()
            .expect("rule lookups are synchronous")
            .unwrap();
        assert!(affected);
    }

    #[test]
    fn path_unaffected_when_filters_agree() {
        let fx = fixture();
        let mut filter = RuleSetFilter::new();
        filter.hide(fid("F1"), vec![path("doc")]);
        filter.hide(fid("F2"), vec![path("doc")]);
        let store = view(&fx, filter);

        // Hidden under both.
        let affected = store
            .path_affected_by_filter_change(path("doc"), path("doc"), &fid("F1"), &fid("F2"))
            .now()
            .expect("rule lookups are synchronous")
            .unwrap();
        assert!(!affected);

        // Visible under both.
        let affected = store
            .path_affected_by_filter_change(path("src"), path("src"), &fid("F1"), &fid("F2"))
            .now()
            .expect("rule lookups are synchronous")
            .unwrap();
        assert!(!affected);
    }

    #[test]
    fn path_affected_stays_pending_with_slow_filter() {
        let fx = fixture();
        let store = FilteredBackingStore::new(
            Arc::clone(&fx.store) as Arc<dyn BackingStore>,
            Box::new(PendingFilter),
        );

        let affected =
            store.path_affected_by_filter_change(path("p"), path("p"), &fid("F1"), &fid("F2"));
        assert!(affected.now().is_err());
    }

    // -----------------------------------------------------------------------
    // Root id plumbing
    // -----------------------------------------------------------------------

    #[test]
    fn parse_render_root_id_roundtrip() {
        let fx = fixture();
        let store = view(&fx, RuleSetFilter::new());

        let root = filtered_root(&fx, "sparse:tools");
        let rendered = store.render_root_id(&root).unwrap();
        let reparsed = store.parse_root_id(&rendered).unwrap();
        assert_eq!(reparsed, root);
    }

    #[test]
    fn parse_root_id_preserves_empty_filter() {
        let fx = fixture();
        let store = view(&fx, RuleSetFilter::new());

        let root = filtered_root(&fx, "");
        let reparsed = store.parse_root_id(root.as_bytes()).unwrap();
        assert_eq!(reparsed, root);
    }

    #[test]
    fn parse_root_id_rejects_bare_inner_ids() {
        let fx = fixture();
        let store = view(&fx, RuleSetFilter::new());

        // A raw id starting with an unterminated varint cannot be split.
        let err = store.parse_root_id(&[0xFF, 0xFF]).unwrap_err();
        assert!(matches!(err, StoreError::MalformedRootId(_)));
    }

    // -----------------------------------------------------------------------
    // Passthroughs
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn manifest_import_strips_the_filter_id() {
        let fx = fixture();
        let store = view(&fx, RuleSetFilter::new());

        let manifest = ManifestId::new([9; 20]);
        store
            .import_manifest_for_root(&filtered_root(&fx, "F"), &manifest)
            .await
            .unwrap();
        // Registered under the inner root id, not the filtered one.
        assert_eq!(fx.store.imported_manifest(&fx.inner_root), Some(manifest));
    }

    #[test]
    fn object_id_parse_render_pass_through() {
        let fx = fixture();
        let store = view(&fx, RuleSetFilter::new());

        let id = store.parse_object_id(&[1, 2, 3]).unwrap();
        assert_eq!(store.render_object_id(&id).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn repo_name_and_management_pass_through() {
        let store_inner = Arc::new(InMemoryBackingStore::with_repo_name("fixture"));
        let store = FilteredBackingStore::new(
            Arc::clone(&store_inner) as Arc<dyn BackingStore>,
            Box::new(RuleSetFilter::new()),
        );

        assert_eq!(store.get_repo_name(), Some("fixture".to_string()));
        store.periodic_management_task();
        assert_eq!(store_inner.management_runs(), 1);
    }
}
