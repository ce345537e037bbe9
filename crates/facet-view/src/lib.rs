//! Filtered views over a content-addressed backing store.
//!
//! This crate implements the Facet core: a [`FilteredBackingStore`] that sits
//! in front of any [`BackingStore`] and hides the entries a [`PathFilter`]
//! says a view must not see. The same inner repository can be served through
//! any number of filters concurrently; a view is selected purely by the ids
//! flowing through it.
//!
//! # Id scheme
//!
//! Every id a view hands out embeds what is needed to re-apply the filter:
//!
//! - Object ids are [`FilteredObjectId`]s: a tag byte, then for trees the
//!   path from the containing root and the filter id, then the inner id.
//! - Root ids are length-prefixed: `<lengthVarint><innerRootId><filterId>`
//!   (see [`create_filtered_root_id`] / [`parse_filter_id_from_root_id`]).
//!
//! Because the filter id rides inside the ids, a tree fetched today and a
//! tree fetched tomorrow through the same id always see the same view, and
//! [`BackingStore::compare_objects_by_id`] can reason about filter changes
//! from the ids alone.
//!
//! [`BackingStore`]: facet_store::BackingStore
//! [`PathFilter`]: facet_filter::PathFilter
//! [`BackingStore::compare_objects_by_id`]: facet_store::BackingStore::compare_objects_by_id

pub mod object_id;
pub mod root_id;
pub mod store;

mod varint;

pub use object_id::{FilteredObjectId, FilteredObjectType};
pub use root_id::{create_filtered_root_id, parse_filter_id_from_root_id};
pub use store::FilteredBackingStore;
