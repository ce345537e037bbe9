//! The backing-store contract for Facet filtered repository views.
//!
//! A backing store is a content-addressed provider of source-control objects:
//! root trees, trees, and blobs, plus the id parsing/rendering and
//! housekeeping operations a virtual filesystem needs from its object source.
//!
//! # Contents
//!
//! - [`BackingStore`] — the store trait, consumed and implemented by the
//!   filtering layer (decorator pattern)
//! - [`Tree`], [`TreeEntry`], [`Blob`] — the object model
//! - [`InMemoryBackingStore`] — `HashMap`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. Objects are immutable once produced; ids are value types.
//! 2. Fetching operations return [`LazyFuture`]s and may suspend;
//!    [`BackingStore::compare_objects_by_id`] never suspends.
//! 3. Concurrent reads are always safe.
//! 4. All errors are propagated, never silently ignored.
//!
//! [`LazyFuture`]: facet_future::LazyFuture

pub mod error;
pub mod memory;
pub mod object;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryBackingStore;
pub use object::{Blob, BlobMetadata, CaseSensitivity, Tree, TreeEntry, TreeEntryKind};
pub use traits::{
    BackingStore, BlobMetadataResult, BlobResult, ObjectComparison, ObjectOrigin, RootTreeResult,
    TreeResult,
};
